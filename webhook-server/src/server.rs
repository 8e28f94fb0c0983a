//! HTTP server receiving CloudEvents webhooks.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use nowplaying_core::TrackEvent;
use tokio::sync::oneshot;
use warp::http::header::{HeaderValue, WWW_AUTHENTICATE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::auth::BasicAuth;
use crate::cloudevent::CloudEvent;
use crate::config::WebhookConfig;
use crate::error::{EnvelopeError, WebhookError};
use crate::router::EventRouter;

/// Body of a successful delivery
pub const EVENT_RECEIVED: &str = "Event Received";

/// Body of a 401 response
pub const UNAUTHORIZED_MESSAGE: &str =
    "Could not verify your access level for that URL.\nYou have to login with proper credentials";

/// Media types accepted on `/webhook`
pub const SUPPORTED_MEDIA_TYPES: [&str; 2] = ["application/cloudevents+json", "application/json"];

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Webhook server running on its own thread.
///
/// The server owns a current-thread tokio runtime so the rest of the daemon
/// can stay synchronous. Accepted track events are delivered on the
/// `std::sync::mpsc` sender handed to [`WebhookServer::start`].
///
/// # Example
///
/// ```no_run
/// use std::sync::mpsc;
/// use webhook_server::{WebhookConfig, WebhookServer};
///
/// let (tx, rx) = mpsc::channel();
/// let server = WebhookServer::start(WebhookConfig::default(), tx)?;
/// println!("Listening on {}", server.local_addr());
///
/// for event in rx.try_iter() {
///     println!("{} from {}", event.kind, event.source);
/// }
///
/// server.shutdown();
/// # Ok::<(), webhook_server::WebhookError>(())
/// ```
pub struct WebhookServer {
    /// Address the listener is bound to
    local_addr: SocketAddr,
    /// Shutdown signal sender
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Server thread handle
    thread: Option<JoinHandle<()>>,
}

impl WebhookServer {
    /// Bind the listener and start serving.
    ///
    /// Blocks until the listener is bound, so a port conflict is reported
    /// here rather than on the server thread.
    pub fn start(
        config: WebhookConfig,
        event_sender: mpsc::Sender<TrackEvent>,
    ) -> Result<Self, WebhookError> {
        let addr = config.socket_addr();
        let routes = routes(&config, event_sender);

        let (ready_tx, ready_rx) = mpsc::channel::<Result<SocketAddr, WebhookError>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::Builder::new()
            .name("webhook-server".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = ready_tx.send(Err(WebhookError::Runtime(e.to_string())));
                        return;
                    }
                };

                rt.block_on(async move {
                    let bound = warp::serve(routes).try_bind_with_graceful_shutdown(
                        addr,
                        async move {
                            let _ = shutdown_rx.await;
                        },
                    );

                    match bound {
                        Ok((local_addr, server)) => {
                            tracing::info!(%local_addr, "Webhook server listening");
                            let _ = ready_tx.send(Ok(local_addr));
                            server.await;
                            tracing::info!("Webhook server stopped");
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(WebhookError::Bind {
                                addr: addr.to_string(),
                                reason: e.to_string(),
                            }));
                        }
                    }
                });
            })
            .map_err(|e| WebhookError::Runtime(e.to_string()))?;

        let local_addr = ready_rx.recv().map_err(|_| WebhookError::NotReady)??;

        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://<addr>/webhook`
    pub fn webhook_url(&self) -> String {
        format!("http://{}/webhook", self.local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests
    pub fn shutdown(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Webhook server thread panicked");
            }
        }
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for WebhookServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The complete filter tree served by [`WebhookServer`]
pub fn routes(
    config: &WebhookConfig,
    event_sender: mpsc::Sender<TrackEvent>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let auth = BasicAuth::new(config.users.clone());
    if !auth.has_users() {
        tracing::warn!("No webhook users configured, every request will be refused");
    }
    let router = EventRouter::from_config(config, event_sender);
    let realm: Arc<str> = Arc::from(config.realm.as_str());

    warp::path!("webhook")
        .and(warp::post())
        .and(authorized(auth))
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and_then(move |content_type: Option<String>, body: Bytes| {
            let router = router.clone();
            async move { receive_event(&router, content_type.as_deref(), &body) }
        })
        .recover(move |err| handle_rejection(err, realm.clone()))
}

fn authorized(auth: BasicAuth) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and_then(move |header: Option<String>| {
            let auth = auth.clone();
            async move {
                if auth.verify(header.as_deref()) {
                    Ok::<(), Rejection>(())
                } else {
                    tracing::warn!("Rejecting webhook with invalid credentials");
                    Err(warp::reject::custom(Unauthorized))
                }
            }
        })
        .untuple_one()
}

fn receive_event(
    router: &EventRouter,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<warp::reply::WithStatus<&'static str>, Rejection> {
    if !is_supported_media_type(content_type) {
        tracing::warn!(content_type = ?content_type, "Unsupported media type");
        return Err(warp::reject::custom(UnsupportedContentType));
    }

    let event = CloudEvent::parse(body).map_err(invalid_envelope)?;
    router.route(&event).map_err(invalid_envelope)?;

    tracing::info!(
        id = %event.id,
        source = %event.source,
        event_type = %event.event_type,
        "Received event"
    );

    Ok(warp::reply::with_status(EVENT_RECEIVED, StatusCode::OK))
}

fn invalid_envelope(error: EnvelopeError) -> Rejection {
    tracing::warn!(%error, "Rejecting webhook");
    warp::reject::custom(InvalidEnvelope(error))
}

/// Compare the media type, ignoring parameters such as `charset`
fn is_supported_media_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();

    SUPPORTED_MEDIA_TYPES
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(media_type))
}

/// Custom rejection for missing or wrong credentials.
#[derive(Debug)]
struct Unauthorized;

impl warp::reject::Reject for Unauthorized {}

/// Custom rejection for a body that is not a CloudEvents JSON document.
#[derive(Debug)]
struct UnsupportedContentType;

impl warp::reject::Reject for UnsupportedContentType {}

/// Custom rejection for an envelope that failed validation.
#[derive(Debug)]
struct InvalidEnvelope(EnvelopeError);

impl warp::reject::Reject for InvalidEnvelope {}

/// Handle rejections and convert them to HTTP responses.
async fn handle_rejection(err: Rejection, realm: Arc<str>) -> Result<Response, Infallible> {
    let response = if err.find::<Unauthorized>().is_some() {
        let mut response =
            warp::reply::with_status(UNAUTHORIZED_MESSAGE, StatusCode::UNAUTHORIZED)
                .into_response();
        if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")) {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    } else if err.find::<UnsupportedContentType>().is_some() {
        json_error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "The server does not support the media type transmitted in the request.",
        )
    } else if let Some(InvalidEnvelope(error)) = err.find::<InvalidEnvelope>() {
        json_error(StatusCode::BAD_REQUEST, &error.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        json_error(StatusCode::LENGTH_REQUIRED, "Content-Length required")
    } else if err.is_not_found() || err.find::<warp::reject::MethodNotAllowed>().is_some() {
        json_error(StatusCode::NOT_FOUND, "Not Found")
    } else {
        tracing::error!(?err, "Unhandled rejection");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(response)
}

/// Error body encoded as a JSON string
fn json_error(code: StatusCode, description: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&description), code).into_response()
}
