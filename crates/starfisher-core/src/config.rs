//! Engine-level defaults.
//!
//! An explicit value threaded into scaffolding and the writer rather than
//! ambient constants, so tests and embedders can inject alternatives.

use starfisher_domain::Location;

/// Fallbacks applied when a workspace does not carry its own defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineDefaults {
    pub location: Location,
    pub language: String,
    pub theme: String,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            location: Location {
                name: "Prague".to_string(),
                latitude: 50.0875,
                longitude: 14.4214,
                timezone: "Europe/Prague".to_string(),
            },
            language: "cs".to_string(),
            theme: "default".to_string(),
        }
    }
}
