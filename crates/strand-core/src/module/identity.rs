use serde_json::Value;

use crate::module::runtime::check_optional_string;
use crate::module::{ModuleConfig, ModuleError, ModuleResult, ModuleRuntime};

/// Identity module - handles OID identity records ("oid" module name)
pub struct IdentityModule {
    config: ModuleConfig,
}

impl IdentityModule {
    /// Create a new identity module
    pub fn new(config: ModuleConfig) -> Self {
        Self { config }
    }
}

impl ModuleRuntime for IdentityModule {
    fn name(&self) -> &str {
        &self.config.id
    }

    fn version(&self) -> &str {
        &self.config.version
    }

    fn validate(&self, body: &Value, _context: Option<&Value>) -> ModuleResult<()> {
        if !body.is_object() {
            return Err(ModuleError::InvalidBody(
                "identity body must be an object".to_string(),
            ));
        }

        // `name` is optional, but when present it must be a usable string
        if let Some(name) = body.get("name") {
            match name.as_str() {
                Some(s) if !s.trim().is_empty() => {}
                _ => {
                    return Err(ModuleError::InvalidBody(
                        "'name' must be a non-empty string when present".to_string(),
                    ));
                }
            }
        }

        check_optional_string(body, "namespace")?;

        Ok(())
    }

    fn normalize(&self, mut body: Value) -> Value {
        // Trim stray whitespace from the display name before it is hashed
        if let Some(obj) = body.as_object_mut() {
            if let Some(Value::String(name)) = obj.get_mut("name") {
                if name.trim().len() != name.len() {
                    let trimmed = name.trim().to_string();
                    *name = trimmed;
                }
            }
        }
        body
    }

    fn projections(&self) -> &[&'static str] {
        &["name", "namespace"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> IdentityModule {
        IdentityModule::new(ModuleConfig::new(
            "oid".to_string(),
            "1.0.0".to_string(),
            serde_json::json!({}),
        ))
    }

    #[test]
    fn test_identity_module_accepts_minimal_body() {
        let module = module();
        assert_eq!(module.name(), "oid");
        assert!(module
            .validate(&serde_json::json!({"name": "alice"}), None)
            .is_ok());
        assert!(module.validate(&serde_json::json!({}), None).is_ok());
    }

    #[test]
    fn test_identity_module_rejects_non_object() {
        let module = module();
        assert!(module.validate(&serde_json::json!("alice"), None).is_err());
        assert!(module.validate(&serde_json::json!([1, 2]), None).is_err());
    }

    #[test]
    fn test_identity_module_rejects_blank_name() {
        let module = module();
        assert!(module
            .validate(&serde_json::json!({"name": "   "}), None)
            .is_err());
        assert!(module
            .validate(&serde_json::json!({"name": 42}), None)
            .is_err());
    }

    #[test]
    fn test_identity_module_normalizes_name() {
        let module = module();
        let body = module.normalize(serde_json::json!({"name": "  alice  "}));
        assert_eq!(body.get("name"), Some(&serde_json::json!("alice")));
    }

    #[test]
    fn test_identity_module_projections() {
        assert!(module().projections().contains(&"name"));
    }
}
