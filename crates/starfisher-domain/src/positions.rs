//! Computed results and the position-computation collaborator seam.
//!
//! The engine never computes positions itself and never persists them: a
//! [`Horoscope`] lives only in memory, attached transiently to a chart, and
//! a [`PositionSource`] is invoked fresh whenever positions are needed.

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::chart::{ChartInstance, Location};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub id: String,
    pub definition_id: String,
    pub degree: f64,
    pub sign: String,
    pub retrograde: bool,
    pub speed: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub number: u8,
    pub cusp_degree: f64,
    pub sign: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    #[serde(rename = "type")]
    pub kind: String,
    pub source_id: String,
    pub target_id: String,
    pub angle: f64,
    pub orb: f64,
}

/// A fully computed chart. Transient: stripped before any serialization of
/// the owning chart and discarded when found in raw document data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Horoscope {
    #[serde(with = "time::serde::rfc3339")]
    pub for_time: OffsetDateTime,
    pub location: Location,
    pub bodies: Vec<CelestialBody>,
    pub houses: Vec<House>,
    pub aspects: Vec<Aspect>,
}

/// Extended per-object position as produced by richer engines.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedPosition {
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declination: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_ascension: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azimuth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical: Option<IndexMap<String, f64>>,
}

/// Position of a single object: a bare ecliptic longitude or an extended
/// record, depending on the selected engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Longitude(f64),
    Extended(ExtendedPosition),
}

impl Position {
    #[must_use]
    pub fn longitude(&self) -> f64 {
        match self {
            Position::Longitude(deg) => *deg,
            Position::Extended(ext) => ext.longitude,
        }
    }
}

/// External computation service: chart parameters in, per-object positions
/// out. Possibly failing; results are cached only transiently by callers.
pub trait PositionSource {
    fn positions_for(&self, chart: &ChartInstance) -> Result<IndexMap<String, Position>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_longitude_deserializes_untagged() {
        let pos: Position = serde_yaml::from_str("123.5").expect("bare number");
        assert_eq!(pos, Position::Longitude(123.5));
        assert!((pos.longitude() - 123.5).abs() < f64::EPSILON);
    }

    #[test]
    fn extended_record_deserializes_untagged() {
        let pos: Position =
            serde_yaml::from_str("{longitude: 10.0, declination: -3.2}").expect("record");
        match pos {
            Position::Extended(ext) => {
                assert!((ext.longitude - 10.0).abs() < f64::EPSILON);
                assert_eq!(ext.declination, Some(-3.2));
            }
            Position::Longitude(_) => panic!("expected extended position"),
        }
    }
}
