//! Model registry
//!
//! A static mapping from (capability, provider, model id) to model metadata. The registry is
//! populated once and is read-only afterwards; lookups have no side effects.

pub mod catalog;

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::types::Capability;

/// Metadata for one supported model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub capability: Capability,
    pub provider: String,
    pub model_id: String,
    pub label: String,
}

impl ModelDescriptor {
    pub fn new(
        capability: Capability,
        provider: impl Into<String>,
        model_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            capability,
            provider: provider.into(),
            model_id: model_id.into(),
            label: label.into(),
        }
    }

    /// `owner/name` part of the model id (strips a pinned version).
    pub fn model_name(&self) -> &str {
        self.model_id
            .split_once(':')
            .map_or(self.model_id.as_str(), |(name, _)| name)
    }

    /// Pinned version hash, when the id is `owner/name:version`.
    pub fn version(&self) -> Option<&str> {
        self.model_id.split_once(':').map(|(_, version)| version)
    }
}

type RegistryKey = (Capability, String, String);

/// Read-only lookup table of supported models.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    by_key: HashMap<RegistryKey, ModelDescriptor>,
}

impl ModelRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from the built-in catalog.
    pub fn builtin() -> Self {
        Self::from_models(catalog::builtin_models())
    }

    /// Process-wide built-in registry, initialised on first use.
    pub fn shared() -> &'static ModelRegistry {
        static SHARED: OnceLock<ModelRegistry> = OnceLock::new();
        SHARED.get_or_init(Self::builtin)
    }

    pub fn from_models(models: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        let mut registry = Self::new();
        for model in models {
            registry.register(model);
        }
        registry
    }

    /// Register a descriptor, replacing any previous entry with the same key.
    pub fn register(&mut self, model: ModelDescriptor) {
        let key = (model.capability, model.provider.clone(), model.model_id.clone());
        self.by_key.insert(key, model);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_model(mut self, model: ModelDescriptor) -> Self {
        self.register(model);
        self
    }

    /// Look up a model for a capability. Exact, case-sensitive match.
    pub fn resolve(
        &self,
        capability: Capability,
        provider: &str,
        model_id: &str,
    ) -> Option<&ModelDescriptor> {
        self.by_key
            .get(&(capability, provider.to_string(), model_id.to_string()))
    }

    /// Models registered for a capability, sorted by provider then id.
    pub fn models_for(&self, capability: Capability) -> Vec<&ModelDescriptor> {
        let mut models: Vec<_> = self
            .by_key
            .values()
            .filter(|m| m.capability == capability)
            .collect();
        models.sort_by(|a, b| (&a.provider, &a.model_id).cmp(&(&b.provider, &b.model_id)));
        models
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::catalog::{REPLICATE, image_to_image, image_to_video};
    use super::*;

    #[test]
    fn builtin_resolves_per_capability() {
        let registry = ModelRegistry::builtin();
        let model = registry
            .resolve(
                Capability::ImageToVideo,
                REPLICATE,
                image_to_video::KLING_V1_6_STANDARD,
            )
            .expect("kling registered");
        assert_eq!(model.label, "Kling v1.6 Standard");

        // Same id under the other capability is not a match.
        assert!(
            registry
                .resolve(
                    Capability::ImageToImage,
                    REPLICATE,
                    image_to_video::KLING_V1_6_STANDARD
                )
                .is_none()
        );
        assert!(
            registry
                .resolve(
                    Capability::ImageToImage,
                    "openai",
                    image_to_image::FLUX_1_1_PRO
                )
                .is_none()
        );
    }

    #[test]
    fn versioned_ids_split() {
        let model = ModelDescriptor::new(
            Capability::ImageToVideo,
            REPLICATE,
            "owner/name:abc123",
            "Pinned",
        );
        assert_eq!(model.model_name(), "owner/name");
        assert_eq!(model.version(), Some("abc123"));

        let model = ModelDescriptor::new(Capability::ImageToVideo, REPLICATE, "owner/name", "x");
        assert_eq!(model.version(), None);
    }

    #[test]
    fn models_for_is_sorted_and_filtered() {
        let registry = ModelRegistry::new()
            .with_model(ModelDescriptor::new(Capability::ImageToImage, "b", "m2", "M2"))
            .with_model(ModelDescriptor::new(Capability::ImageToImage, "a", "m1", "M1"))
            .with_model(ModelDescriptor::new(Capability::ImageToVideo, "a", "v1", "V1"));
        let ids: Vec<_> = registry
            .models_for(Capability::ImageToImage)
            .into_iter()
            .map(|m| m.model_id.as_str())
            .collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn shared_registry_is_builtin() {
        assert_eq!(ModelRegistry::shared().len(), ModelRegistry::builtin().len());
    }
}
