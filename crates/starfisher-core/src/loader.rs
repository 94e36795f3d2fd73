//! Manifest loading and workspace assembly.
//!
//! Loading is lenient by design: a workspace with one corrupt chart file
//! still loads its other charts. Per-entity failures are collected as
//! [`SkippedEntity`] records instead of being discarded, so callers that
//! cannot tolerate silent data loss can treat skips as fatal. Structural
//! failures (a missing manifest, a reference escaping the base directory)
//! abort the load outright.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use starfisher_domain::{
    Annotation, ChartInstance, ChartPreset, ChartSubject, EntityKind, EphemerisSource, ViewLayout,
    Workspace, WorkspaceDefaults, MANIFEST_FILE_NAME,
};
use tracing::warn;

use crate::codec;
use crate::error::{Result, WorkspaceError};
use crate::manifest::{DefaultBlock, EntityRef, EphemerisField, ManifestDoc};
use crate::paths::resolve_under_base;

/// One manifest entry that could not be resolved into a typed entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedEntity {
    pub kind: EntityKind,
    pub reference: String,
    pub reason: String,
}

/// Result of a workspace load: the assembled aggregate plus the entries
/// the lenient loaders had to skip.
#[derive(Clone, Debug)]
pub struct WorkspaceLoad {
    pub workspace: Workspace,
    pub skipped: Vec<SkippedEntity>,
}

impl WorkspaceLoad {
    /// True when every manifest entry resolved cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Loads a workspace from its manifest file.
///
/// Fails with [`WorkspaceError::NotFound`] when the manifest is absent and
/// [`WorkspaceError::PathTraversal`] when any reference escapes the
/// manifest's directory. Entity-level problems never fail the load.
pub fn load_workspace(manifest_path: &Path) -> Result<WorkspaceLoad> {
    let doc: ManifestDoc = codec::read_yaml(manifest_path)?;
    let base = manifest_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    assemble(&doc, &base)
}

/// Loads a workspace given its base directory.
pub fn load_workspace_dir(base: &Path) -> Result<WorkspaceLoad> {
    if !base.is_dir() {
        return Err(WorkspaceError::NotFound {
            path: base.to_path_buf(),
        });
    }
    load_workspace(&base.join(MANIFEST_FILE_NAME))
}

fn assemble(doc: &ManifestDoc, base: &Path) -> Result<WorkspaceLoad> {
    let mut skipped = Vec::new();

    let chart_presets: Vec<ChartPreset> =
        load_entities(base, EntityKind::Presets, doc.refs(EntityKind::Presets), &mut skipped)?;
    let subjects: Vec<ChartSubject> =
        load_entities(base, EntityKind::Subjects, doc.refs(EntityKind::Subjects), &mut skipped)?;
    let charts: Vec<ChartInstance> =
        load_entities(base, EntityKind::Charts, doc.refs(EntityKind::Charts), &mut skipped)?;
    let layouts: Vec<ViewLayout> =
        load_entities(base, EntityKind::Layouts, doc.refs(EntityKind::Layouts), &mut skipped)?;
    let annotations = load_annotations(base, doc.refs(EntityKind::Annotations), &mut skipped)?;

    let default = doc
        .default
        .as_ref()
        .map(DefaultBlock::to_defaults)
        .unwrap_or_default();
    let aspects = doc
        .aspects
        .clone()
        .or_else(|| doc.default_aspects.clone())
        .or_else(|| default.default_aspects.clone())
        .unwrap_or_default();
    let default_ephemeris = resolve_ephemeris(doc, &default);

    let workspace = Workspace {
        owner: doc.owner.clone(),
        default_ephemeris,
        active_model: doc.active_model.clone(),
        active_model_name: doc.active_model_name.clone(),
        aspects,
        default,
        chart_presets,
        subjects,
        charts,
        layouts,
        annotations,
    };
    Ok(WorkspaceLoad { workspace, skipped })
}

/// The ephemeris descriptor, degrading to strings derived from the nested
/// `default:` block when the top-level field is absent.
fn resolve_ephemeris(doc: &ManifestDoc, defaults: &WorkspaceDefaults) -> EphemerisSource {
    match &doc.default_ephemeris {
        Some(EphemerisField::Source(source)) => source.clone(),
        Some(EphemerisField::Name(name)) => EphemerisSource {
            name: name.clone(),
            backend: String::new(),
        },
        None => EphemerisSource {
            name: defaults.ephemeris_backend.clone().unwrap_or_default(),
            backend: defaults
                .ephemeris_engine
                .map(|engine| engine.to_string())
                .unwrap_or_default(),
        },
    }
}

fn load_entities<T: DeserializeOwned>(
    base: &Path,
    kind: EntityKind,
    refs: &[EntityRef],
    skipped: &mut Vec<SkippedEntity>,
) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(refs.len());
    for entity_ref in refs {
        match resolve_entity::<T>(base, entity_ref) {
            Ok(entity) => out.push(entity),
            Err(err @ WorkspaceError::PathTraversal { .. }) => return Err(err),
            Err(err) => skip(kind, entity_ref, &err, skipped),
        }
    }
    Ok(out)
}

fn resolve_entity<T: DeserializeOwned>(base: &Path, entity_ref: &EntityRef) -> Result<T> {
    match entity_ref {
        EntityRef::Path(reference) => {
            let full = resolve_under_base(base, reference)?;
            codec::read_yaml(&full)
        }
        EntityRef::Inline(value) => serde_yaml::from_value(value.clone())
            .map_err(|err| WorkspaceError::malformed(base, err)),
    }
}

/// Annotations accept one extra file shape: a plain text document, taken
/// verbatim as the note content with the file stem as its title.
fn load_annotations(
    base: &Path,
    refs: &[EntityRef],
    skipped: &mut Vec<SkippedEntity>,
) -> Result<Vec<Annotation>> {
    let mut out = Vec::with_capacity(refs.len());
    for entity_ref in refs {
        let loaded = match entity_ref {
            EntityRef::Path(reference) => {
                resolve_under_base(base, reference).and_then(|full| {
                    let text = codec::read_text(&full)?;
                    Ok(annotation_from_text(reference, &text))
                })
            }
            EntityRef::Inline(value) => serde_yaml::from_value(value.clone())
                .map_err(|err| WorkspaceError::malformed(base, err)),
        };
        match loaded {
            Ok(annotation) => out.push(annotation),
            Err(err @ WorkspaceError::PathTraversal { .. }) => return Err(err),
            Err(err) => skip(EntityKind::Annotations, entity_ref, &err, skipped),
        }
    }
    Ok(out)
}

fn annotation_from_text(reference: &str, text: &str) -> Annotation {
    if let Ok(annotation) = serde_yaml::from_str::<Annotation>(text) {
        return annotation;
    }
    let title = Path::new(reference)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("note")
        .to_string();
    Annotation {
        title,
        content: text.to_string(),
        created: None,
        author: "unknown".to_string(),
    }
}

fn skip(
    kind: EntityKind,
    entity_ref: &EntityRef,
    err: &WorkspaceError,
    skipped: &mut Vec<SkippedEntity>,
) {
    let reference = entity_ref.display();
    warn!(kind = %kind, reference = %reference, reason = %err, "skipping manifest entry");
    skipped.push(SkippedEntity {
        kind,
        reference,
        reason: err.to_string(),
    });
}
