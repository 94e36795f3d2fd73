//! Chart entities and their configuration.
//!
//! A [`ChartInstance`] is the most structurally involved entity in a
//! workspace: a subject (who/when/where), a calculation configuration, an
//! optional transient computed result, and a tag set. Its identity (the
//! explicit id when present, else the subject name) is what the CRUD and
//! persistence layers key on.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::positions::Horoscope;

/// Calculation mode of a chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChartMode {
    #[default]
    Natal,
    Event,
    Horary,
    Composite,
}

/// House division system.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
pub enum HouseSystem {
    #[default]
    Placidus,
    #[serde(rename = "Whole Sign")]
    #[strum(serialize = "Whole Sign")]
    WholeSign,
    Campanus,
    Koch,
    Equal,
    Regiomontanus,
    #[serde(rename = "Vehlow")]
    #[strum(serialize = "Vehlow")]
    Vehlow,
    Porphyry,
    Alcabitius,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
pub enum ZodiacType {
    #[default]
    Tropical,
    Sidereal,
}

/// Computation engine selection.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EngineType {
    Swisseph,
    Jyotish,
    Jpl,
    Custom,
}

/// Sidereal zero-point correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ayanamsa {
    Lahiri,
    Raman,
    Krishnamurti,
    FaganBradley,
    DeLuce,
    UserDefined,
}

/// Time representation used for input/output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSystem {
    Gregorian,
    JulianDay,
    JulianCalendar,
    UnixTimestamp,
    OrdinalDate,
    IsoWeekDate,
    CompactDate,
}

/// Immutable place value, always owned by exactly one subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

/// Who or what a chart is cast for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSubject {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub event_time: OffsetDateTime,
    pub location: Location,
}

impl ChartSubject {
    /// Stable key for file naming: explicit id when present, else the name.
    #[must_use]
    pub fn key(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }
}

/// Per-chart calculation settings.
///
/// Optional fields are genuine overrides; `None` means "inherit from the
/// workspace or model defaults" and is omitted from persisted documents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub mode: ChartMode,
    #[serde(default)]
    pub house_system: HouseSystem,
    #[serde(default)]
    pub zodiac_type: ZodiacType,
    #[serde(default)]
    pub included_points: Vec<String>,
    #[serde(default)]
    pub aspect_orbs: IndexMap<String, f64>,
    #[serde(default)]
    pub display_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_ephemeris: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ayanamsa: Option<Ayanamsa>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observable_objects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_system: Option<TimeSystem>,
}

/// A chart as it lives in the workspace aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartInstance {
    #[serde(default)]
    pub id: String,
    pub subject: ChartSubject,
    #[serde(default)]
    pub config: ChartConfig,
    /// Cached computed result. Always recomputable, never persisted and
    /// never trusted from disk.
    #[serde(skip)]
    pub computed: Option<Horoscope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ChartInstance {
    /// Derived identity: the explicit id when non-empty, else the subject
    /// name. Two charts with the same identity are the same logical chart.
    #[must_use]
    pub fn identity(&self) -> &str {
        if self.id.is_empty() {
            &self.subject.name
        } else {
            &self.id
        }
    }
}

/// Lightweight projection of a chart for listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSummary {
    pub id: String,
    pub name: String,
    pub event_time: String,
    pub location: String,
    pub engine: String,
    pub zodiac_type: String,
    pub house_system: String,
    pub tags: Vec<String>,
}

impl ChartSummary {
    #[must_use]
    pub fn of(chart: &ChartInstance) -> Self {
        let event_time = chart
            .subject
            .event_time
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self {
            id: chart.id.clone(),
            name: chart.subject.name.clone(),
            event_time,
            location: chart.subject.location.name.clone(),
            engine: chart
                .config
                .engine
                .map(|e| e.to_string())
                .unwrap_or_default(),
            zodiac_type: chart.config.zodiac_type.to_string(),
            house_system: chart.config.house_system.to_string(),
            tags: chart.tags.clone(),
        }
    }
}
