//! Catalog collaborator seam.
//!
//! Models (body and aspect definition sets) are produced elsewhere; the
//! engine only ever asks "which identifiers does this model know?". The
//! validator consumes this trait and nothing else.

use std::collections::{BTreeMap, BTreeSet};

/// Known identifier sets of one model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelIds {
    pub body_ids: BTreeSet<String>,
    pub aspect_ids: BTreeSet<String>,
}

impl ModelIds {
    #[must_use]
    pub fn new<B, A, S>(bodies: B, aspects: A) -> Self
    where
        B: IntoIterator<Item = S>,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            body_ids: bodies.into_iter().map(Into::into).collect(),
            aspect_ids: aspects.into_iter().map(Into::into).collect(),
        }
    }
}

/// External catalog service: resolves a model name to its identifier sets.
pub trait ModelCatalog {
    fn model(&self, name: &str) -> Option<&ModelIds>;
}

/// In-memory catalog, primarily for tests and embedded setups.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    models: BTreeMap<String, ModelIds>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_model(mut self, name: impl Into<String>, ids: ModelIds) -> Self {
        self.models.insert(name.into(), ids);
        self
    }
}

impl ModelCatalog for StaticCatalog {
    fn model(&self, name: &str) -> Option<&ModelIds> {
        self.models.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_catalog_resolves_by_name() {
        let catalog = StaticCatalog::new().with_model(
            "hellenic",
            ModelIds::new(["sun", "moon"], ["conjunction", "trine"]),
        );
        let ids = catalog.model("hellenic").expect("model present");
        assert!(ids.body_ids.contains("sun"));
        assert!(ids.aspect_ids.contains("trine"));
        assert!(catalog.model("missing").is_none());
    }
}
