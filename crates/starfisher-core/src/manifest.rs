//! On-disk manifest document shapes.
//!
//! The manifest is the single source of truth for which files belong to a
//! workspace. These types describe its serialized form only; the typed
//! aggregate lives in `starfisher_domain`. Reading is deliberately more
//! permissive than writing: legacy field spellings are accepted on the way
//! in, the canonical shape is produced on the way out.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use starfisher_domain::{
    EngineType, EntityKind, EphemerisSource, HouseSystem, Location, TimeSystem, Workspace,
    WorkspaceDefaults,
};

use crate::config::EngineDefaults;

/// One element of a manifest collection list: a path relative to the
/// workspace base, or the entity embedded inline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Path(String),
    Inline(serde_yaml::Value),
}

impl EntityRef {
    /// Human-readable form for skip reports and logs.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            EntityRef::Path(path) => path.clone(),
            EntityRef::Inline(_) => "<inline>".to_string(),
        }
    }
}

/// Top-level `default_ephemeris` accepts the canonical `{name, backend}`
/// mapping or a legacy bare string naming the data set.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EphemerisField {
    Source(EphemerisSource),
    Name(String),
}

/// Manifest as read from disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ManifestDoc {
    pub owner: String,
    pub default_ephemeris: Option<EphemerisField>,
    pub active_model: Option<String>,
    pub active_model_name: Option<String>,
    pub aspects: Option<Vec<String>>,
    /// Legacy spelling of the aspect list, superseded by `aspects`.
    pub default_aspects: Option<Vec<String>>,
    pub default: Option<DefaultBlock>,
    pub chart_presets: Vec<EntityRef>,
    pub subjects: Vec<EntityRef>,
    pub charts: Vec<EntityRef>,
    pub layouts: Vec<EntityRef>,
    pub annotations: Vec<EntityRef>,
}

impl ManifestDoc {
    pub(crate) fn refs(&self, kind: EntityKind) -> &[EntityRef] {
        match kind {
            EntityKind::Presets => &self.chart_presets,
            EntityKind::Subjects => &self.subjects,
            EntityKind::Charts => &self.charts,
            EntityKind::Layouts => &self.layouts,
            EntityKind::Annotations => &self.annotations,
        }
    }
}

/// The nested `default:` block, location flattened into scalar keys for
/// backward compatibility with existing manifests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DefaultBlock {
    pub ephemeris_engine: Option<String>,
    pub ephemeris_backend: Option<String>,
    pub location_name: Option<String>,
    pub location_latitude: Option<f64>,
    pub location_longitude: Option<f64>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub theme: Option<String>,
    pub default_house_system: Option<HouseSystem>,
    pub default_bodies: Option<Vec<String>>,
    pub default_aspects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observable_objects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_system: Option<TimeSystem>,
}

impl DefaultBlock {
    /// Typed view of the block. An unrecognized engine string degrades to
    /// `None` rather than failing the manifest load.
    pub(crate) fn to_defaults(&self) -> WorkspaceDefaults {
        let location = match (
            &self.location_name,
            self.location_latitude,
            self.location_longitude,
            &self.timezone,
        ) {
            (Some(name), Some(latitude), Some(longitude), Some(timezone))
                if !name.is_empty() && !timezone.is_empty() =>
            {
                Some(Location {
                    name: name.clone(),
                    latitude,
                    longitude,
                    timezone: timezone.clone(),
                })
            }
            _ => None,
        };
        WorkspaceDefaults {
            ephemeris_engine: self
                .ephemeris_engine
                .as_deref()
                .and_then(|raw| EngineType::from_str(raw.trim()).ok()),
            ephemeris_backend: self.ephemeris_backend.clone(),
            location,
            language: self.language.clone(),
            theme: self.theme.clone(),
            default_house_system: self.default_house_system,
            default_bodies: self.default_bodies.clone(),
            default_aspects: self.default_aspects.clone(),
            observable_objects: self.observable_objects.clone(),
            time_system: self.time_system,
        }
    }

    /// Serialized form of a workspace's defaults, filling gaps from the
    /// engine-level fallbacks.
    pub(crate) fn from_workspace(ws: &Workspace, fallback: &EngineDefaults) -> Self {
        let d = &ws.default;
        let location = d.location.as_ref().unwrap_or(&fallback.location);
        Self {
            ephemeris_engine: d.ephemeris_engine.map(|engine| engine.to_string()),
            ephemeris_backend: d.ephemeris_backend.clone(),
            location_name: Some(location.name.clone()),
            location_latitude: Some(location.latitude),
            location_longitude: Some(location.longitude),
            timezone: Some(location.timezone.clone()),
            language: Some(
                d.language
                    .clone()
                    .unwrap_or_else(|| fallback.language.clone()),
            ),
            theme: Some(d.theme.clone().unwrap_or_else(|| fallback.theme.clone())),
            default_house_system: d.default_house_system,
            default_bodies: d.default_bodies.clone(),
            default_aspects: d.default_aspects.clone(),
            observable_objects: d.observable_objects.clone(),
            time_system: d.time_system,
        }
    }
}

/// Manifest as written to disk. Field order is the document order.
#[derive(Debug, Serialize)]
pub(crate) struct ManifestOut {
    pub owner: String,
    pub default_ephemeris: EphemerisSource,
    pub active_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_model_name: Option<String>,
    pub aspects: Vec<String>,
    pub default: DefaultBlock,
    pub chart_presets: Vec<String>,
    pub subjects: Vec<String>,
    pub charts: Vec<String>,
    pub layouts: Vec<String>,
    pub annotations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_accepts_path_and_inline_forms() {
        let refs: Vec<EntityRef> =
            serde_yaml::from_str("- charts/ada.yml\n- {name: inline-preset}\n").expect("refs");
        assert_eq!(refs[0], EntityRef::Path("charts/ada.yml".to_string()));
        assert!(matches!(refs[1], EntityRef::Inline(_)));
        assert_eq!(refs[1].display(), "<inline>");
    }

    #[test]
    fn default_block_builds_location_only_when_complete() {
        let block: DefaultBlock = serde_yaml::from_str(
            "location_name: Prague\nlocation_latitude: 50.1\nlocation_longitude: 14.4\ntimezone: Europe/Prague\n",
        )
        .expect("block");
        let defaults = block.to_defaults();
        let location = defaults.location.expect("location");
        assert_eq!(location.name, "Prague");

        let partial: DefaultBlock =
            serde_yaml::from_str("location_name: Prague\n").expect("partial block");
        assert!(partial.to_defaults().location.is_none());
    }

    #[test]
    fn unknown_engine_string_degrades_to_none() {
        let block: DefaultBlock =
            serde_yaml::from_str("ephemeris_engine: not-an-engine\n").expect("block");
        assert!(block.to_defaults().ephemeris_engine.is_none());

        let block: DefaultBlock =
            serde_yaml::from_str("ephemeris_engine: JPL\n").expect("block");
        assert_eq!(block.to_defaults().ephemeris_engine, Some(EngineType::Jpl));
    }
}
