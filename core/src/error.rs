use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Mode does not allow continues")]
    ContinueNotAllowed,
    #[error("Game is not accepting moves")]
    GameNotActive,
    #[error("Could not import history: {0}")]
    Import(String),
    #[error("Could not export history: {0}")]
    Export(String),
    #[error("Invalid mode configuration: {0}")]
    Config(String),
}

pub type Result<T> = core::result::Result<T, RulesError>;
