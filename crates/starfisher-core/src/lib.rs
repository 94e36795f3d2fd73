#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

//! Persistence and synchronization engine for chart workspaces.
//!
//! A workspace is a directory of small YAML documents aggregated through
//! one manifest. This crate loads that aggregate, persists it back out,
//! keeps manifest and disk reconciled, and validates cross-references.
//! Position computation and model catalogs are external collaborators,
//! reached only through the traits in `starfisher_domain`.

pub mod codec;
pub mod config;
pub mod crud;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod paths;
pub mod sync;
pub mod validate;
pub mod writer;

pub use config::EngineDefaults;
pub use crud::{
    add_chart, add_or_update_chart, add_subject, chart_summaries, recompute_all, remove_chart,
    remove_chart_and_save,
};
pub use error::{Result, WorkspaceError};
pub use loader::{load_workspace, load_workspace_dir, SkippedEntity, WorkspaceLoad};
pub use manifest::EntityRef;
pub use paths::resolve_under_base;
pub use sync::{
    init_workspace, prune_workspace, scan_workspace, sync_workspace, DriftReport, KindDrift,
    PruneSummary, SyncOptions, SyncReport,
};
pub use validate::{
    is_usable, validate_workspace, validation_report, Severity, ValidationIssue,
};
pub use writer::{export_workspace_flat, safe_file_stem, save_workspace, ExportFormat};
