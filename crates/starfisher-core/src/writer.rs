//! Workspace persistence: per-entity files plus the manifest.
//!
//! Entity files are written before the manifest, so an interrupted save
//! can only leave orphan files (recoverable by the pruner), never a
//! manifest referencing documents that do not exist yet.

use std::path::{Path, PathBuf};

use serde::Serialize;
use starfisher_domain::{EntityKind, Workspace, ENTITY_FILE_EXT, MANIFEST_FILE_NAME};
use tracing::debug;

use crate::codec;
use crate::config::EngineDefaults;
use crate::error::Result;
use crate::manifest::{DefaultBlock, ManifestOut};
use crate::paths::resolve_under_base;

/// Output document format for the flat export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Yaml,
    Json,
}

/// Derives a filesystem-safe file stem from an entity name.
///
/// Lower-cases, keeps ASCII alphanumerics, collapses everything else into
/// single hyphens, and falls back to `"item"` when nothing survives.
#[must_use]
pub fn safe_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !stem.is_empty() {
                stem.push('-');
            }
            pending_hyphen = false;
            stem.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if stem.is_empty() {
        "item".to_string()
    } else {
        stem
    }
}

/// Relative reference for an entity of `kind` named by `stem`.
#[must_use]
pub fn entity_rel_path(kind: EntityKind, stem: &str) -> String {
    format!("{}/{stem}.{ENTITY_FILE_EXT}", kind.subdir())
}

/// Persists the whole aggregate under `base`, returning the manifest path.
///
/// Creates the five canonical subdirectories, writes one document per
/// entity, then rewrites the manifest referencing exactly the files just
/// written. Cached computed chart results and placeholder config fields
/// are omitted by the entities' own serialized forms.
pub fn save_workspace(
    ws: &Workspace,
    base: &Path,
    defaults: &EngineDefaults,
) -> Result<PathBuf> {
    for kind in EntityKind::ALL {
        let dir = base.join(kind.subdir());
        std::fs::create_dir_all(&dir)
            .map_err(|err| crate::error::WorkspaceError::io(&dir, err))?;
    }

    let chart_presets = write_entities(base, EntityKind::Presets, &ws.chart_presets, |preset| {
        safe_file_stem(&preset.name)
    })?;
    let subjects = write_entities(base, EntityKind::Subjects, &ws.subjects, |subject| {
        safe_file_stem(subject.key())
    })?;
    let charts = write_entities(base, EntityKind::Charts, &ws.charts, |chart| {
        safe_file_stem(chart.identity())
    })?;
    let layouts = write_entities(base, EntityKind::Layouts, &ws.layouts, |layout| {
        safe_file_stem(&layout.name)
    })?;
    let annotations =
        write_entities(base, EntityKind::Annotations, &ws.annotations, |note| {
            safe_file_stem(&note.title)
        })?;

    let manifest = ManifestOut {
        owner: ws.owner.clone(),
        default_ephemeris: ws.default_ephemeris.clone(),
        active_model: ws.active_model.clone(),
        active_model_name: ws.active_model_name.clone(),
        aspects: ws.aspects.clone(),
        default: DefaultBlock::from_workspace(ws, defaults),
        chart_presets,
        subjects,
        charts,
        layouts,
        annotations,
    };
    let manifest_path = base.join(MANIFEST_FILE_NAME);
    codec::write_yaml(&manifest_path, &manifest)?;
    debug!(base = %base.display(), charts = ws.charts.len(), "workspace saved");
    Ok(manifest_path)
}

fn write_entities<T, F>(
    base: &Path,
    kind: EntityKind,
    items: &[T],
    stem_of: F,
) -> Result<Vec<String>>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    let mut refs = Vec::with_capacity(items.len());
    for item in items {
        let reference = entity_rel_path(kind, &stem_of(item));
        let full = resolve_under_base(base, &reference)?;
        codec::write_yaml(&full, item)?;
        refs.push(reference);
    }
    Ok(refs)
}

/// Serializes the whole aggregate to one document at `path`.
///
/// Cached computed results stay stripped through the entities' serialized
/// forms, same as in per-entity persistence.
pub fn export_workspace_flat(ws: &Workspace, path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Yaml => codec::write_yaml(path, ws),
        ExportFormat::Json => codec::write_json(path, ws),
    }
}
