use thiserror::Error;

/// Failure reported by a signing or query capability: the call reached the
/// chain (or tried to) and came back with an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CapabilityError {
    pub message: String,
    /// Nested detail from the node or contract, when the transport had any.
    pub response: Option<String>,
}

impl CapabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Message plus nested response detail, for display to the issuer.
    pub fn detailed(&self) -> String {
        match &self.response {
            Some(response) if !response.is_empty() => format!("{} ({})", self.message, response),
            _ => self.message.clone(),
        }
    }
}

pub type CapabilityResult<T> = Result<T, CapabilityError>;
