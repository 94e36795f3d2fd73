#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod catalog;
pub mod chart;
pub mod positions;
pub mod workspace;

pub use catalog::{ModelCatalog, ModelIds, StaticCatalog};
pub use chart::{
    Ayanamsa, ChartConfig, ChartInstance, ChartMode, ChartSubject, ChartSummary, EngineType,
    HouseSystem, Location, TimeSystem, ZodiacType,
};
pub use positions::{
    Aspect, CelestialBody, ExtendedPosition, Horoscope, House, Position, PositionSource,
};
pub use workspace::{
    Annotation, ChartPreset, EntityKind, EphemerisSource, LayoutStyle, ViewLayout, ViewModule,
    ViewModuleType, Workspace, WorkspaceDefaults, ENTITY_FILE_EXT, MANIFEST_FILE_NAME,
};
