use thiserror::Error;

/// Prefix for error messages composed from a remote fault.
pub const ERROR_PREFIX: &str = "Request failed";

/// Shown when a fault carries no description of its own.
pub const UNKNOWN_FAULT: &str = "unknown error";

/// Local validation failures. These never reach the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("prompt required")]
    PromptRequired,
}

/// The mutually-exclusive display state of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Error,
    Result,
}

/// Everything that can happen to the console, from the UI or from the
/// completion of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PromptChanged(String),
    GenerateRequested,
    CallSucceeded(String),
    CallFailed(Option<String>),
}

/// What the runtime must do after applying an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Issue exactly one remote call carrying this (already trimmed) prompt.
    StartCall(String),
}

/// The prompt console state machine.
///
/// Owns the session state (prompt, phase, error, result) and nothing
/// else: no I/O, no timers. The runtime feeds it [`Event`]s and acts on
/// the returned [`Effect`].
#[derive(Debug, Default)]
pub struct Console {
    prompt: String,
    phase: Phase,
    error: Option<String>,
    result: Option<String>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Whether the generate trigger is enabled: disabled while a call is
    /// in flight or while the prompt is blank.
    pub fn can_generate(&self) -> bool {
        self.phase != Phase::Loading && !self.prompt.trim().is_empty()
    }

    pub fn apply(&mut self, event: Event) -> Effect {
        match event {
            Event::PromptChanged(text) => {
                self.prompt = text;
                // Editing clears a displayed error; a displayed result
                // stays until the next generate.
                if self.phase == Phase::Error {
                    self.error = None;
                    self.phase = Phase::Idle;
                }
                Effect::None
            }
            Event::GenerateRequested => {
                if self.phase == Phase::Loading {
                    return Effect::None;
                }
                let trimmed = self.prompt.trim();
                if trimmed.is_empty() {
                    self.error = Some(GenerateError::PromptRequired.to_string());
                    self.result = None;
                    self.phase = Phase::Error;
                    return Effect::None;
                }
                let prompt = trimmed.to_string();
                self.error = None;
                self.result = None;
                self.phase = Phase::Loading;
                Effect::StartCall(prompt)
            }
            Event::CallSucceeded(text) => {
                if self.phase == Phase::Loading {
                    self.result = Some(text);
                    self.phase = Phase::Result;
                }
                Effect::None
            }
            Event::CallFailed(description) => {
                if self.phase == Phase::Loading {
                    let description = description
                        .filter(|d| !d.trim().is_empty())
                        .unwrap_or_else(|| UNKNOWN_FAULT.to_string());
                    self.error = Some(format!("{ERROR_PREFIX}: {description}"));
                    self.phase = Phase::Error;
                }
                Effect::None
            }
        }
    }
}
