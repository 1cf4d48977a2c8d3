use serde_json::Value;

use crate::module::runtime::{check_optional_string, require_string_field};
use crate::module::{ModuleConfig, ModuleError, ModuleResult, ModuleRuntime};

/// Asset module - handles owned-asset records
pub struct AssetModule {
    config: ModuleConfig,
}

impl AssetModule {
    /// Create a new asset module
    pub fn new(config: ModuleConfig) -> Self {
        Self { config }
    }
}

impl ModuleRuntime for AssetModule {
    fn name(&self) -> &str {
        &self.config.id
    }

    fn version(&self) -> &str {
        &self.config.version
    }

    fn validate(&self, body: &Value, _context: Option<&Value>) -> ModuleResult<()> {
        if !body.is_object() {
            return Err(ModuleError::InvalidBody(
                "asset body must be an object".to_string(),
            ));
        }

        require_string_field(body, "owner_oid")?;
        check_optional_string(body, "asset_type")?;

        Ok(())
    }

    fn projections(&self) -> &[&'static str] {
        &["owner_oid", "asset_type"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> AssetModule {
        AssetModule::new(ModuleConfig::new(
            "asset".to_string(),
            "1.0.0".to_string(),
            serde_json::json!({}),
        ))
    }

    #[test]
    fn test_asset_module_validate_success() {
        assert!(module()
            .validate(
                &serde_json::json!({"owner_oid": "oid:acme:YWxpY2U", "asset_type": "ticket"}),
                None,
            )
            .is_ok());
    }

    #[test]
    fn test_asset_module_requires_owner() {
        assert!(module()
            .validate(&serde_json::json!({"asset_type": "ticket"}), None)
            .is_err());
    }
}
