//! The workspace aggregate and its satellite entities.
//!
//! A [`Workspace`] is assembled from one manifest document plus the entity
//! files it references. Once in memory every collection element is fully
//! typed; references are resolved eagerly at load time, never lazily.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::chart::{ChartConfig, ChartInstance, ChartSubject, EngineType, HouseSystem, Location, TimeSystem};

/// Manifest file name inside a workspace base directory.
pub const MANIFEST_FILE_NAME: &str = "workspace.yaml";

/// Extension used for per-entity documents.
pub const ENTITY_FILE_EXT: &str = "yml";

/// Which ephemeris data a workspace computes against by default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemerisSource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub backend: String,
}

/// Named, reusable chart configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartPreset {
    pub name: String,
    pub config: ChartConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutStyle {
    #[default]
    Single,
    TimelineOverlay,
    DualWheel,
    Comparison,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewModuleType {
    #[serde(rename = "WheelView")]
    Wheel,
    #[serde(rename = "TransitTimeline")]
    Timeline,
    #[serde(rename = "AspectGrid")]
    Grid,
    #[serde(rename = "SummaryTable")]
    Table,
    #[serde(rename = "InterpretationText")]
    Text,
}

/// A view component placed inside a layout; its config is opaque to the
/// engine (interpreted by UI collaborators only).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewModule {
    #[serde(rename = "type")]
    pub kind: ViewModuleType,
    #[serde(default)]
    pub config: serde_yaml::Value,
}

/// Arrangement of charts on screen. References charts by identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewLayout {
    pub name: String,
    #[serde(default)]
    pub layout_style: LayoutStyle,
    #[serde(default)]
    pub chart_instances: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ViewModule>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(default = "default_author")]
    pub author: String,
}

fn default_author() -> String {
    "unknown".to_string()
}

fn default_title() -> String {
    "note".to_string()
}

/// Aggregated default settings for a workspace, the typed form of the
/// manifest's nested `default:` block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeris_engine: Option<EngineType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeris_backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_house_system: Option<HouseSystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bodies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_aspects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observable_objects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_system: Option<TimeSystem>,
}

/// The aggregate root: one workspace directory held fully typed in memory.
///
/// Owned exclusively by the calling session; the engine assumes
/// single-writer access to a base directory and imposes no locking.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub default_ephemeris: EphemerisSource,
    /// Retained for backward compatibility; prefer `active_model_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_model_name: Option<String>,
    #[serde(default)]
    pub aspects: Vec<String>,
    #[serde(default)]
    pub default: WorkspaceDefaults,
    #[serde(default)]
    pub chart_presets: Vec<ChartPreset>,
    #[serde(default)]
    pub subjects: Vec<ChartSubject>,
    #[serde(default)]
    pub charts: Vec<ChartInstance>,
    #[serde(default)]
    pub layouts: Vec<ViewLayout>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Workspace {
    /// Name of the active model, preferring the explicit
    /// `active_model_name` over the legacy `active_model` field.
    #[must_use]
    pub fn active_model_name(&self) -> Option<&str> {
        self.active_model_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                self.active_model
                    .as_deref()
                    .filter(|name| !name.is_empty())
            })
    }

    /// Looks a chart up by derived identity.
    #[must_use]
    pub fn find_chart(&self, identity: &str) -> Option<&ChartInstance> {
        self.charts.iter().find(|c| c.identity() == identity)
    }

    pub fn chart_identities(&self) -> impl Iterator<Item = &str> {
        self.charts.iter().map(ChartInstance::identity)
    }
}

/// The five entity kinds with a canonical subdirectory under the workspace
/// base. Shared by the writer, drift scanner, and pruner so the three
/// always agree on where a kind lives and which manifest list names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Presets,
    Subjects,
    Charts,
    Layouts,
    Annotations,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Presets,
        EntityKind::Subjects,
        EntityKind::Charts,
        EntityKind::Layouts,
        EntityKind::Annotations,
    ];

    /// Canonical subdirectory under the workspace base.
    #[must_use]
    pub fn subdir(self) -> &'static str {
        match self {
            EntityKind::Presets => "presets",
            EntityKind::Subjects => "subjects",
            EntityKind::Charts => "charts",
            EntityKind::Layouts => "layouts",
            EntityKind::Annotations => "annotations",
        }
    }

    /// Key of the reference list in the manifest document.
    #[must_use]
    pub fn manifest_key(self) -> &'static str {
        match self {
            EntityKind::Presets => "chart_presets",
            EntityKind::Subjects => "subjects",
            EntityKind::Charts => "charts",
            EntityKind::Layouts => "layouts",
            EntityKind::Annotations => "annotations",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.subdir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_model_name_prefers_explicit_field() {
        let ws = Workspace {
            active_model: Some("legacy".to_string()),
            active_model_name: Some("hellenic".to_string()),
            ..Workspace::default()
        };
        assert_eq!(ws.active_model_name(), Some("hellenic"));
    }

    #[test]
    fn active_model_name_falls_back_to_legacy_field() {
        let ws = Workspace {
            active_model: Some("legacy".to_string()),
            active_model_name: Some(String::new()),
            ..Workspace::default()
        };
        assert_eq!(ws.active_model_name(), Some("legacy"));

        let empty = Workspace::default();
        assert_eq!(empty.active_model_name(), None);
    }

    #[test]
    fn entity_kinds_cover_all_canonical_subdirs() {
        let subdirs: Vec<_> = EntityKind::ALL.iter().map(|k| k.subdir()).collect();
        assert_eq!(
            subdirs,
            vec!["presets", "subjects", "charts", "layouts", "annotations"]
        );
        assert_eq!(EntityKind::Presets.manifest_key(), "chart_presets");
    }
}
