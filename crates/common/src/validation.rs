/// Malformed caller input, rejected before any lifecycle or network work starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl ValidationError {
    /// Machine-readable code surfaced alongside the message
    pub fn code(&self) -> String {
        match self {
            ValidationError::MissingField(field) => {
                format!("MISSING_{}", field.to_ascii_uppercase())
            }
            ValidationError::Invalid(_) => "INVALID_INPUT".to_string(),
        }
    }
}
