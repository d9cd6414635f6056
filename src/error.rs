use std::fmt;

/// Everything that can go wrong between an input trigger and an audible tone.
///
/// None of these ever reach the person using the page: trigger entry points
/// swallow them and log at debug level. The `try_*` APIs surface them.
#[derive(Debug, Clone, PartialEq)]
pub enum ToneError {
    /// The platform refused or failed to create/resume the audio output.
    OutputUnavailable { reason: String },
    /// A note name that is not in the note table.
    UnknownNote { name: String },
    /// A resolved note has no on-screen element to highlight.
    MissingTargetElement { note: String },
    /// A tone parameter outside its valid range.
    InvalidRequest { field: &'static str, value: f64 },
    /// Configuration could not be parsed or failed validation.
    Config(String),
}

impl fmt::Display for ToneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneError::OutputUnavailable { reason } => {
                write!(f, "Audio output unavailable: {reason}")
            }
            ToneError::UnknownNote { name } => write!(f, "Unknown note '{name}'"),
            ToneError::MissingTargetElement { note } => {
                write!(f, "No element for note '{note}'")
            }
            ToneError::InvalidRequest { field, value } => {
                write!(f, "Invalid tone {field}: {value}")
            }
            ToneError::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for ToneError {}

impl From<serde_json::Error> for ToneError {
    fn from(e: serde_json::Error) -> Self {
        ToneError::Config(e.to_string())
    }
}
