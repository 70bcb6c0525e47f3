use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The encoder resource could not be created or configured.
    /// Fatal to the session; callers tear down and report upward.
    Configuration(String),
    /// API misuse: an operation was invoked in a state that does not allow it.
    State(String),
    /// The underlying encoder rejected or failed on a frame.
    Encoding(String),
    /// The stream sink rejected a packet it agreed to accept.
    Sink(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StreamError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            StreamError::State(msg) => write!(f, "Invalid state: {}", msg),
            StreamError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            StreamError::Sink(msg) => write!(f, "Sink error: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {}
