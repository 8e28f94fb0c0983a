//! HTTP basic authentication

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Verifies `Authorization: Basic ...` headers against a fixed user table.
///
/// An empty user table rejects every request.
#[derive(Debug, Clone, Default)]
pub struct BasicAuth {
    users: Arc<HashMap<String, String>>,
}

impl BasicAuth {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }

    pub fn has_users(&self) -> bool {
        !self.users.is_empty()
    }

    /// Check the raw header value
    pub fn verify(&self, header: Option<&str>) -> bool {
        match header.and_then(decode_credentials) {
            Some((user, password)) => self
                .users
                .get(&user)
                .is_some_and(|expected| *expected == password),
            None => false,
        }
    }
}

fn decode_credentials(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(credentials: &str) -> String {
        format!("Basic {}", STANDARD.encode(credentials))
    }

    fn auth() -> BasicAuth {
        BasicAuth::new(HashMap::from([("rabe".to_string(), "rabe".to_string())]))
    }

    #[test]
    fn test_valid_credentials() {
        assert!(auth().verify(Some(&header("rabe:rabe"))));
        assert!(auth().verify(Some(&format!("basic {}", STANDARD.encode("rabe:rabe")))));
    }

    #[test]
    fn test_invalid_credentials() {
        let auth = auth();
        assert!(!auth.verify(None));
        assert!(!auth.verify(Some(&header("rabe:wrong"))));
        assert!(!auth.verify(Some(&header("other:rabe"))));
        assert!(!auth.verify(Some(&header("rabe"))));
        assert!(!auth.verify(Some("Basic not-base64!")));
        assert!(!auth.verify(Some("Bearer abc")));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let auth = BasicAuth::new(HashMap::from([("user".to_string(), "a:b".to_string())]));
        assert!(auth.verify(Some(&header("user:a:b"))));
    }

    proptest::proptest! {
        #[test]
        fn test_any_registered_user_is_accepted(
            user in "[a-z][a-z0-9_]{0,11}",
            password in "[ -~]{0,16}",
        ) {
            let auth = BasicAuth::new(HashMap::from([(user.clone(), password.clone())]));
            let credentials = format!("{user}:{password}");
            proptest::prop_assert!(auth.verify(Some(&header(&credentials))));

            let wrong = format!("{user}:{password}x");
            proptest::prop_assert!(!auth.verify(Some(&header(&wrong))));
        }
    }

    #[test]
    fn test_empty_user_table_rejects_everyone() {
        let auth = BasicAuth::new(crate::config::parse_users("").unwrap());
        assert!(!auth.has_users());
        assert!(!auth.verify(None));
        assert!(!auth.verify(Some(&header("rabe:rabe"))));
        assert!(!auth.verify(Some(&header(":"))));
    }
}
