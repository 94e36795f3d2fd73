//! Disk-vs-manifest reconciliation: drift scanning, pruning, scaffolding,
//! and the combined sync pass.
//!
//! Drift scanning is advisory and pure: it never mutates anything and
//! tolerates an unreadable manifest by reporting no drift. Pruning edits
//! the manifest document in its raw form so unknown keys survive the
//! rewrite, and it never deletes entity files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use starfisher_domain::{
    ChartInstance, ChartSubject, EntityKind, EphemerisSource, Workspace, ENTITY_FILE_EXT,
    MANIFEST_FILE_NAME,
};
use tracing::{debug, warn};

use crate::codec;
use crate::config::EngineDefaults;
use crate::crud;
use crate::error::{Result, WorkspaceError};
use crate::loader::load_workspace_dir;
use crate::paths::resolve_under_base;
use crate::writer::save_workspace;

/// Basename-level differences for one entity kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KindDrift {
    /// Files present in the kind's subdirectory but referenced nowhere.
    pub new_on_disk: Vec<String>,
    /// Manifest references whose backing file is gone.
    pub missing_on_disk: Vec<String>,
}

impl KindDrift {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.new_on_disk.is_empty() && self.missing_on_disk.is_empty()
    }
}

/// Drift across all entity kinds. Kinds with no drift still appear, so
/// callers can iterate without special-casing absence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DriftReport {
    pub kinds: BTreeMap<EntityKind, KindDrift>,
}

impl DriftReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.kinds.values().all(KindDrift::is_clean)
    }

    #[must_use]
    pub fn of(&self, kind: EntityKind) -> &KindDrift {
        static EMPTY: KindDrift = KindDrift {
            new_on_disk: Vec::new(),
            missing_on_disk: Vec::new(),
        };
        self.kinds.get(&kind).unwrap_or(&EMPTY)
    }
}

/// References removed from the manifest by a prune pass, per kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub removed: BTreeMap<EntityKind, Vec<String>>,
}

impl PruneSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.values().all(Vec::is_empty)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.removed.values().map(Vec::len).sum()
    }
}

/// Compares files on disk against manifest references for every kind.
///
/// Pure diff: mutates nothing. An unreadable manifest yields an empty
/// report rather than an error, since scanning is advisory.
#[must_use]
pub fn scan_workspace(base: &Path) -> DriftReport {
    let manifest = match codec::read_yaml_value(&base.join(MANIFEST_FILE_NAME)) {
        Ok(value) => value,
        Err(err) => {
            debug!(base = %base.display(), reason = %err, "manifest unreadable, reporting no drift");
            return DriftReport::default();
        }
    };

    let mut kinds = BTreeMap::new();
    for kind in EntityKind::ALL {
        let referenced = referenced_basenames(&manifest, kind);
        let present = present_basenames(&base.join(kind.subdir()));
        let new_on_disk: Vec<String> = present.difference(&referenced).cloned().collect();
        let missing_on_disk: Vec<String> = referenced.difference(&present).cloned().collect();
        kinds.insert(
            kind,
            KindDrift {
                new_on_disk,
                missing_on_disk,
            },
        );
    }
    DriftReport { kinds }
}

/// String references of `kind`, reduced to their file basenames.
fn referenced_basenames(manifest: &serde_yaml::Value, kind: EntityKind) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    if let Some(entries) = manifest.get(kind.manifest_key()).and_then(|v| v.as_sequence()) {
        for entry in entries {
            if let Some(reference) = entry.as_str() {
                let basename = Path::new(reference)
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or(reference);
                names.insert(basename.to_string());
            }
        }
    }
    names
}

fn present_basenames(dir: &Path) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return names;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_entity = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == ENTITY_FILE_EXT);
        if is_entity {
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.insert(name.to_string());
            }
        }
    }
    names
}

/// Drops manifest references whose backing file no longer exists.
///
/// Operates on the raw manifest document so keys this engine does not
/// model survive the rewrite. Inline entries are kept unconditionally.
/// Never deletes a file; writes the manifest only when something was
/// actually dropped. An unreadable manifest yields an empty summary.
pub fn prune_workspace(base: &Path) -> Result<PruneSummary> {
    let manifest_path = base.join(MANIFEST_FILE_NAME);
    let mut manifest = match codec::read_yaml_value(&manifest_path) {
        Ok(value) => value,
        Err(err) => {
            debug!(base = %base.display(), reason = %err, "manifest unreadable, nothing to prune");
            return Ok(PruneSummary::default());
        }
    };

    let mut summary = PruneSummary::default();
    for kind in EntityKind::ALL {
        let Some(entries) = manifest
            .get_mut(kind.manifest_key())
            .and_then(serde_yaml::Value::as_sequence_mut)
        else {
            continue;
        };
        let mut kept = Vec::with_capacity(entries.len());
        let mut dropped = Vec::new();
        for entry in entries.drain(..) {
            if let Some(reference) = entry.as_str() {
                let full = resolve_under_base(base, reference)?;
                if full.is_file() {
                    kept.push(entry);
                } else {
                    dropped.push(reference.to_string());
                }
            } else {
                kept.push(entry);
            }
        }
        *entries = kept;
        if !dropped.is_empty() {
            warn!(kind = %kind, count = dropped.len(), "pruning dangling references");
            summary.removed.insert(kind, dropped);
        }
    }

    if !summary.is_empty() {
        codec::write_yaml(&manifest_path, &manifest)?;
    }
    Ok(summary)
}

/// Scaffolds an empty workspace: the five canonical subdirectories plus an
/// initial manifest referencing nothing.
pub fn init_workspace(
    base: &Path,
    owner: &str,
    active_model: Option<&str>,
    default_ephemeris: EphemerisSource,
    defaults: &EngineDefaults,
) -> Result<Workspace> {
    std::fs::create_dir_all(base).map_err(|err| WorkspaceError::io(base, err))?;
    let ws = Workspace {
        owner: owner.to_string(),
        default_ephemeris,
        active_model_name: active_model.map(str::to_string),
        ..Workspace::default()
    };
    save_workspace(&ws, base, defaults)?;
    Ok(ws)
}

/// What a sync pass is allowed to change.
#[derive(Clone, Debug)]
pub struct SyncOptions {
    /// Load unreferenced chart/subject files and fold them into the
    /// aggregate (with a full save).
    pub import_new: bool,
    /// Drop manifest references with no backing file. Off by default:
    /// removal is opt-in, reporting is not.
    pub prune_missing: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            import_new: true,
            prune_missing: false,
        }
    }
}

/// Outcome of a sync pass.
#[derive(Clone, Debug, Default)]
pub struct SyncReport {
    /// Drift as observed before anything was changed.
    pub drift: DriftReport,
    /// Relative references of entity files imported into the manifest.
    pub imported: Vec<String>,
    /// References dropped by the prune step.
    pub pruned: PruneSummary,
}

/// Reconciles manual on-disk edits back into the manifest.
///
/// Scans first, then (per options) imports new-on-disk charts and subjects
/// through the identity-keyed update path, then prunes references whose
/// files are gone. Files that fail to parse during import are skipped.
pub fn sync_workspace(
    base: &Path,
    options: &SyncOptions,
    defaults: &EngineDefaults,
) -> Result<SyncReport> {
    let drift = scan_workspace(base);
    let mut report = SyncReport {
        drift: drift.clone(),
        ..SyncReport::default()
    };

    if options.import_new {
        report.imported = import_new_entities(base, &drift, defaults)?;
    }
    if options.prune_missing {
        report.pruned = prune_workspace(base)?;
    }
    Ok(report)
}

fn import_new_entities(
    base: &Path,
    drift: &DriftReport,
    defaults: &EngineDefaults,
) -> Result<Vec<String>> {
    let new_charts = &drift.of(EntityKind::Charts).new_on_disk;
    let new_subjects = &drift.of(EntityKind::Subjects).new_on_disk;
    if new_charts.is_empty() && new_subjects.is_empty() {
        return Ok(Vec::new());
    }

    let mut ws = load_workspace_dir(base)?.workspace;
    let mut imported = Vec::new();

    for basename in new_charts {
        let reference = format!("{}/{basename}", EntityKind::Charts.subdir());
        let full = resolve_under_base(base, &reference)?;
        match codec::read_yaml::<ChartInstance>(&full) {
            Ok(chart) => {
                crud::remove_chart(&mut ws, chart.identity());
                ws.charts.push(chart);
                imported.push(reference);
            }
            Err(err) => warn!(reference = %reference, reason = %err, "skipping unimportable chart"),
        }
    }
    for basename in new_subjects {
        let reference = format!("{}/{basename}", EntityKind::Subjects.subdir());
        let full = resolve_under_base(base, &reference)?;
        match codec::read_yaml::<ChartSubject>(&full) {
            Ok(subject) => {
                ws.subjects.retain(|s| s.key() != subject.key());
                ws.subjects.push(subject);
                imported.push(reference);
            }
            Err(err) => {
                warn!(reference = %reference, reason = %err, "skipping unimportable subject");
            }
        }
    }

    if !imported.is_empty() {
        save_workspace(&ws, base, defaults)?;
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CHART_YAML: &str = "\
id: ada
subject:
  name: Ada
  event_time: 2024-01-01T12:00:00Z
  location:
    name: Prague
    latitude: 50.0875
    longitude: 14.4214
    timezone: Europe/Prague
config: {}
";

    fn write(base: &Path, rel: &str, contents: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    #[test]
    fn scan_reports_both_directions_of_drift() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        write(base, "charts/a.yml", CHART_YAML);
        write(base, "charts/stray.yml", CHART_YAML);
        write(
            base,
            "workspace.yaml",
            "owner: Tester\ncharts:\n- charts/a.yml\n- charts/b.yml\n",
        );

        let drift = scan_workspace(base);
        let charts = drift.of(EntityKind::Charts);
        assert_eq!(charts.missing_on_disk, vec!["b.yml".to_string()]);
        assert_eq!(charts.new_on_disk, vec!["stray.yml".to_string()]);
        assert!(drift.of(EntityKind::Subjects).is_clean());

        // Idempotent with no intervening disk changes.
        assert_eq!(scan_workspace(base), drift);
    }

    #[test]
    fn scan_tolerates_unreadable_manifest() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        assert!(scan_workspace(base).is_clean());

        write(base, "workspace.yaml", "owner: [unclosed");
        assert!(scan_workspace(base).is_clean());
    }

    #[test]
    fn prune_drops_dangling_references_only() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        write(base, "charts/a.yml", CHART_YAML);
        write(
            base,
            "workspace.yaml",
            "owner: Tester\nextra_key: kept\ncharts:\n- charts/a.yml\n- charts/b.yml\n",
        );

        let summary = prune_workspace(base).expect("prune");
        assert_eq!(summary.total(), 1);
        assert_eq!(
            summary.removed[&EntityKind::Charts],
            vec!["charts/b.yml".to_string()]
        );
        assert!(base.join("charts/a.yml").is_file(), "prune must not delete files");

        let manifest = fs::read_to_string(base.join("workspace.yaml")).expect("manifest");
        assert!(manifest.contains("charts/a.yml"));
        assert!(!manifest.contains("charts/b.yml"));
        assert!(manifest.contains("extra_key"), "unknown keys survive the rewrite");

        // Second pass is a no-op.
        assert!(prune_workspace(base).expect("second prune").is_empty());
    }

    #[test]
    fn prune_keeps_inline_entries() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        write(
            base,
            "workspace.yaml",
            "owner: Tester\nsubjects:\n- {name: Inline Subject}\n- subjects/gone.yml\n",
        );
        let summary = prune_workspace(base).expect("prune");
        assert_eq!(summary.total(), 1);
        let manifest = fs::read_to_string(base.join("workspace.yaml")).expect("manifest");
        assert!(manifest.contains("Inline Subject"));
    }

    #[test]
    fn prune_without_manifest_is_empty() {
        let dir = tempdir().expect("tempdir");
        assert!(prune_workspace(dir.path()).expect("prune").is_empty());
    }

    #[test]
    fn init_scaffolds_directories_and_manifest() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("fresh");
        let ws = init_workspace(
            &base,
            "Tester",
            Some("hellenic"),
            EphemerisSource {
                name: "de421".to_string(),
                backend: "jpl".to_string(),
            },
            &EngineDefaults::default(),
        )
        .expect("init");

        assert_eq!(ws.owner, "Tester");
        for sub in ["presets", "subjects", "charts", "layouts", "annotations"] {
            assert!(base.join(sub).is_dir());
        }
        let loaded = load_workspace_dir(&base).expect("reload");
        assert_eq!(loaded.workspace.owner, "Tester");
        assert_eq!(loaded.workspace.active_model_name(), Some("hellenic"));
        assert!(loaded.workspace.charts.is_empty());
        assert!(scan_workspace(&base).is_clean());
    }

    #[test]
    fn sync_imports_stray_chart_with_default_options() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        write(base, "charts/ada.yml", CHART_YAML);
        write(
            base,
            "workspace.yaml",
            "owner: Tester\ncharts:\n- charts/gone.yml\n",
        );

        let report =
            sync_workspace(base, &SyncOptions::default(), &EngineDefaults::default())
                .expect("sync");
        assert_eq!(report.imported, vec!["charts/ada.yml".to_string()]);
        assert_eq!(
            report.drift.of(EntityKind::Charts).missing_on_disk,
            vec!["gone.yml".to_string()]
        );
        assert!(report.pruned.is_empty());

        let after = load_workspace_dir(base).expect("reload").workspace;
        assert_eq!(after.charts.len(), 1);
        assert_eq!(after.charts[0].identity(), "ada");
        assert!(scan_workspace(base).is_clean());
    }

    #[test]
    fn sync_defaults_report_missing_references_without_removing_them() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        write(
            base,
            "workspace.yaml",
            "owner: Tester\ncharts:\n- charts/gone.yml\n",
        );

        let report =
            sync_workspace(base, &SyncOptions::default(), &EngineDefaults::default())
                .expect("sync");
        assert_eq!(
            report.drift.of(EntityKind::Charts).missing_on_disk,
            vec!["gone.yml".to_string()]
        );
        assert!(report.pruned.is_empty());
        let manifest = fs::read_to_string(base.join("workspace.yaml")).expect("manifest");
        assert!(manifest.contains("charts/gone.yml"), "default sync must not prune");

        let opts = SyncOptions {
            prune_missing: true,
            ..SyncOptions::default()
        };
        let report =
            sync_workspace(base, &opts, &EngineDefaults::default()).expect("opt-in sync");
        assert_eq!(report.pruned.total(), 1);
        let manifest = fs::read_to_string(base.join("workspace.yaml")).expect("manifest");
        assert!(!manifest.contains("charts/gone.yml"));
    }
}
