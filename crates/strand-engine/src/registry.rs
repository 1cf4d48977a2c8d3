use std::collections::HashMap;
use std::sync::Arc;

use strand_core::module::asset::AssetModule;
use strand_core::module::attestation::AttestationModule;
use strand_core::module::identity::IdentityModule;
use strand_core::{ModuleConfig, ModuleRuntime};

use crate::error::EngineError;

/// Module registry - maps module names to runtimes.
///
/// Owned by each engine instance and effectively immutable after
/// construction. Registration is monotonic: re-registering a name fails.
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn ModuleRuntime>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Build a registry from configuration.
    ///
    /// Unknown module names fail with [`EngineError::ModuleNotFound`].
    pub fn from_config(configs: &[ModuleConfig]) -> Result<Self, EngineError> {
        let mut registry = Self::new();

        for config in configs {
            let runtime: Arc<dyn ModuleRuntime> = match config.id.as_str() {
                "oid" => Arc::new(IdentityModule::new(config.clone())),
                "attestation" => Arc::new(AttestationModule::new(config.clone())),
                "asset" => Arc::new(AssetModule::new(config.clone())),
                other => return Err(EngineError::ModuleNotFound(other.to_string())),
            };

            registry.register(runtime)?;
        }

        Ok(registry)
    }

    /// Register a runtime under its own name
    ///
    /// # Errors
    ///
    /// Fails if the name is already taken.
    pub fn register(&mut self, runtime: Arc<dyn ModuleRuntime>) -> Result<(), EngineError> {
        let name = runtime.name().to_string();

        if self.modules.contains_key(&name) {
            return Err(EngineError::ModuleAlreadyRegistered(name));
        }

        self.modules.insert(name, runtime);
        Ok(())
    }

    /// Look up a runtime by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ModuleRuntime>> {
        self.modules.get(name).cloned()
    }

    /// Look up a runtime, failing with `ModuleNotFound`
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ModuleRuntime>, EngineError> {
        self.get(name)
            .ok_or_else(|| EngineError::ModuleNotFound(name.to_string()))
    }

    /// Check if a module is registered
    pub fn has(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Registered module names
    pub fn names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    /// Registered module count
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(id: &str) -> ModuleConfig {
        ModuleConfig::new(id.to_string(), "1.0.0".to_string(), serde_json::json!({}))
    }

    #[test]
    fn test_registry_from_config() {
        let registry =
            ModuleRegistry::from_config(&[config("oid"), config("attestation"), config("asset")])
                .unwrap();

        assert_eq!(registry.len(), 3);
        assert!(registry.has("oid"));
        assert!(registry.resolve("attestation").is_ok());
    }

    #[test]
    fn test_registry_unknown_module() {
        let err = ModuleRegistry::from_config(&[config("telemetry")]).unwrap_err();
        assert!(matches!(err, EngineError::ModuleNotFound(name) if name == "telemetry"));
    }

    #[test]
    fn test_registry_duplicate_registration_fails() {
        let mut registry = ModuleRegistry::from_config(&[config("oid")]).unwrap();

        let duplicate: Arc<dyn ModuleRuntime> = Arc::new(IdentityModule::new(config("oid")));
        let err = registry.register(duplicate).unwrap_err();

        assert!(matches!(err, EngineError::ModuleAlreadyRegistered(_)));
    }

    #[test]
    fn test_registry_resolve_missing() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.resolve("oid"),
            Err(EngineError::ModuleNotFound(_))
        ));
    }
}
