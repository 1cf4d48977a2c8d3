//! Module-specific error types

use thiserror::Error;

/// Module-specific errors
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Body rejected by the module's validator
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Context rejected by the module's validator
    #[error("invalid context: {0}")]
    InvalidContext(String),

    /// Module configuration error
    #[error("configuration: {0}")]
    Config(String),

    /// Observer hook failure (logged by the engine, never fails an append)
    #[error("hook failed: {0}")]
    Hook(String),
}

/// Module result type
pub type ModuleResult<T> = Result<T, ModuleError>;
