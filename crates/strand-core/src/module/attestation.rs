use serde_json::Value;

use crate::module::runtime::{check_optional_string, require_string_field};
use crate::module::{ModuleConfig, ModuleError, ModuleResult, ModuleRuntime};

/// Attestation module - handles issuer-signed claims about a subject
pub struct AttestationModule {
    config: ModuleConfig,
}

impl AttestationModule {
    /// Create a new attestation module
    pub fn new(config: ModuleConfig) -> Self {
        Self { config }
    }
}

impl ModuleRuntime for AttestationModule {
    fn name(&self) -> &str {
        &self.config.id
    }

    fn version(&self) -> &str {
        &self.config.version
    }

    fn validate(&self, body: &Value, _context: Option<&Value>) -> ModuleResult<()> {
        if !body.is_object() {
            return Err(ModuleError::InvalidBody(
                "attestation body must be an object".to_string(),
            ));
        }

        require_string_field(body, "subject_oid")?;
        require_string_field(body, "issuer_oid")?;
        check_optional_string(body, "kind")?;

        Ok(())
    }

    fn projections(&self) -> &[&'static str] {
        &["subject_oid", "issuer_oid", "kind"]
    }
}
