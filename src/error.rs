use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProsoponError {
    #[error("Validation error in {observation}: field `{field}` {reason}")]
    Validation {
        observation: String,
        field: String,
        reason: String,
    },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Settings error: {0}")]
    Settings(String),
}

impl ProsoponError {
    pub fn invalid(observation: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            observation: observation.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProsoponError>;

// Helper conversions
impl From<config::ConfigError> for ProsoponError {
    fn from(e: config::ConfigError) -> Self { Self::Settings(e.to_string()) }
}
impl From<regex::Error> for ProsoponError {
    fn from(e: regex::Error) -> Self { Self::Configuration(e.to_string()) }
}
