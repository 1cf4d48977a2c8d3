use serde_json::Value;

use crate::module::{ModuleError, ModuleResult};
use crate::Record;

/// Module runtime - validates and normalizes bodies for records carrying
/// its module name.
///
/// Runtimes are registered once at engine construction and live for the
/// engine's lifetime. `validate` runs before hashing; when `normalize` is
/// overridden it rewrites the body before the hash is computed, so the
/// normalized form is what the chain commits to.
pub trait ModuleRuntime: Send + Sync {
    /// Module name, the dispatch key for record bodies
    fn name(&self) -> &str;

    /// Runtime version label
    fn version(&self) -> &str;

    /// Accept or reject a body before it is committed
    fn validate(&self, body: &Value, context: Option<&Value>) -> ModuleResult<()>;

    /// Rewrite the body before hashing. Default: identity.
    fn normalize(&self, body: Value) -> Value {
        body
    }

    /// Body fields this module advertises as queryable
    fn projections(&self) -> &[&'static str] {
        &[]
    }

    /// Observer hook invoked after a record is committed.
    ///
    /// Failures are logged by the engine and never fail the append.
    fn after_append(&self, _record: &Record) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Require a non-empty string field on an object body.
pub(crate) fn require_string_field(body: &Value, field: &str) -> ModuleResult<()> {
    match body.get(field).and_then(|v| v.as_str()) {
        Some(value) if !value.is_empty() => Ok(()),
        Some(_) => Err(ModuleError::InvalidBody(format!(
            "'{field}' cannot be empty"
        ))),
        None => Err(ModuleError::InvalidBody(format!(
            "missing required string field '{field}'"
        ))),
    }
}

/// Reject a present-but-not-a-string optional field.
pub(crate) fn check_optional_string(body: &Value, field: &str) -> ModuleResult<()> {
    match body.get(field) {
        None => Ok(()),
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ModuleError::InvalidBody(format!(
            "'{field}' must be a string when present"
        ))),
    }
}
