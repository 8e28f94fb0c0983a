use super::Input;
use crate::model::{SelectorId, TrackEvent};

/// Ordered set of inputs that all receive every reading
#[derive(Default)]
pub struct InputHandler {
    inputs: Vec<Input>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_observer(&mut self, input: Input) {
        tracing::info!(input = input.name(), "Registering input");
        self.inputs.push(input);
    }

    /// Remove the first input called `name`
    pub fn remove_observer(&mut self, name: &str) -> Option<Input> {
        let index = self.inputs.iter().position(|i| i.name() == name)?;
        tracing::info!(input = name, "Removing input");
        Some(self.inputs.remove(index))
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Forward a reading to every input in registration order
    ///
    /// A failing input is logged and does not stop the others.
    pub fn update(&mut self, reading: SelectorId, event: Option<&TrackEvent>) {
        for input in &mut self.inputs {
            if let Err(e) = input.update(reading, event) {
                tracing::error!(
                    input = input.name(),
                    reading = reading.value(),
                    event = event.map(|e| e.id.as_str()),
                    error = %e,
                    "Input update failed"
                );
            }
        }
    }
}
