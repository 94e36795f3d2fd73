//! Identity-keyed mutations on the chart and subject collections.
//!
//! Two charts sharing a derived identity are the same logical chart:
//! `add_or_update_chart` replaces in place instead of appending, and the
//! replacement reuses the same file name because file names derive from
//! identity. `add_*` operations write only the one new entity file;
//! `add_or_update_chart` additionally rewrites the full manifest so the
//! reference set stays authoritative.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use starfisher_domain::{
    ChartInstance, ChartSubject, ChartSummary, EntityKind, Position, PositionSource, Workspace,
};
use tracing::{debug, warn};

use crate::codec;
use crate::config::EngineDefaults;
use crate::error::Result;
use crate::paths::resolve_under_base;
use crate::writer::{entity_rel_path, safe_file_stem, save_workspace};

/// Appends a chart and writes its one entity file. The manifest is not
/// rewritten; callers batching additions save once at the end.
pub fn add_chart(ws: &mut Workspace, base: &Path, chart: ChartInstance) -> Result<PathBuf> {
    let reference = entity_rel_path(EntityKind::Charts, &safe_file_stem(chart.identity()));
    let full = resolve_under_base(base, &reference)?;
    codec::write_yaml(&full, &chart)?;
    ws.charts.push(chart);
    Ok(full)
}

/// Appends a subject and writes its one entity file, mirroring [`add_chart`].
pub fn add_subject(ws: &mut Workspace, base: &Path, subject: ChartSubject) -> Result<PathBuf> {
    let reference = entity_rel_path(EntityKind::Subjects, &safe_file_stem(subject.key()));
    let full = resolve_under_base(base, &reference)?;
    codec::write_yaml(&full, &subject)?;
    ws.subjects.push(subject);
    Ok(full)
}

/// Inserts or replaces a chart by derived identity, then persists the full
/// workspace. Returns the manifest path.
pub fn add_or_update_chart(
    ws: &mut Workspace,
    base: &Path,
    chart: ChartInstance,
    defaults: &EngineDefaults,
) -> Result<PathBuf> {
    let identity = chart.identity().to_string();
    match ws.charts.iter_mut().find(|c| c.identity() == identity) {
        Some(existing) => {
            debug!(identity = %identity, "replacing chart");
            *existing = chart;
        }
        None => {
            debug!(identity = %identity, "adding chart");
            ws.charts.push(chart);
        }
    }
    save_workspace(ws, base, defaults)
}

/// Drops the chart with the given identity from the aggregate. Returns
/// whether anything was removed; the caller decides whether to persist.
pub fn remove_chart(ws: &mut Workspace, identity: &str) -> bool {
    let before = ws.charts.len();
    ws.charts.retain(|c| c.identity() != identity);
    ws.charts.len() != before
}

/// [`remove_chart`] followed by a full save when something was removed.
///
/// The chart's entity file stays on disk; only its manifest reference goes
/// away with the rewrite.
pub fn remove_chart_and_save(
    ws: &mut Workspace,
    base: &Path,
    identity: &str,
    defaults: &EngineDefaults,
) -> Result<bool> {
    let removed = remove_chart(ws, identity);
    if removed {
        save_workspace(ws, base, defaults)?;
    }
    Ok(removed)
}

/// One-line projections of every chart, for listings.
#[must_use]
pub fn chart_summaries(ws: &Workspace) -> Vec<ChartSummary> {
    ws.charts.iter().map(ChartSummary::of).collect()
}

/// Invokes the computation collaborator for every chart, keyed by identity.
///
/// A failing chart maps to an empty position set instead of failing the
/// batch. Results are returned to the caller only and are never persisted.
pub fn recompute_all(
    ws: &Workspace,
    source: &dyn PositionSource,
) -> IndexMap<String, IndexMap<String, Position>> {
    let mut results = IndexMap::with_capacity(ws.charts.len());
    for chart in &ws.charts {
        let identity = chart.identity().to_string();
        let positions = match source.positions_for(chart) {
            Ok(positions) => positions,
            Err(err) => {
                warn!(identity = %identity, reason = %err, "position computation failed");
                IndexMap::new()
            }
        };
        results.insert(identity, positions);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use starfisher_domain::{ChartConfig, Location};
    use tempfile::tempdir;
    use time::macros::datetime;

    fn chart(name: &str, display_style: &str) -> ChartInstance {
        ChartInstance {
            id: String::new(),
            subject: ChartSubject {
                id: String::new(),
                name: name.to_string(),
                event_time: datetime!(1815-12-10 12:00 +00:00),
                location: Location {
                    name: "London".to_string(),
                    latitude: 51.5,
                    longitude: -0.12,
                    timezone: "Europe/London".to_string(),
                },
            },
            config: ChartConfig {
                display_style: display_style.to_string(),
                ..ChartConfig::default()
            },
            computed: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn add_writes_entity_file_without_manifest() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let mut ws = Workspace::default();
        let path = add_chart(&mut ws, base, chart("Ada", "classic")).expect("add");
        assert!(path.is_file());
        assert_eq!(ws.charts.len(), 1);
        assert!(!base.join("workspace.yaml").exists());
    }

    #[test]
    fn add_or_update_replaces_same_identity() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let defaults = EngineDefaults::default();
        let mut ws = Workspace::default();

        add_or_update_chart(&mut ws, base, chart("Ada", "classic"), &defaults).expect("first");
        add_or_update_chart(&mut ws, base, chart("Ada", "modern"), &defaults).expect("second");

        assert_eq!(ws.charts.len(), 1);
        assert_eq!(ws.charts[0].config.display_style, "modern");
        // Same identity, same file: no second chart document appears.
        let files: Vec<_> = std::fs::read_dir(base.join("charts"))
            .expect("charts dir")
            .filter_map(std::result::Result::ok)
            .collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut ws = Workspace {
            charts: vec![chart("Ada", "classic")],
            ..Workspace::default()
        };
        assert!(remove_chart(&mut ws, "Ada"));
        assert!(!remove_chart(&mut ws, "Ada"));
        assert!(ws.charts.is_empty());
    }

    #[test]
    fn remove_and_save_keeps_entity_file_on_disk() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let defaults = EngineDefaults::default();
        let mut ws = Workspace::default();
        add_or_update_chart(&mut ws, base, chart("Ada", "classic"), &defaults).expect("add");

        let removed =
            remove_chart_and_save(&mut ws, base, "Ada", &defaults).expect("remove");
        assert!(removed);
        assert!(base.join("charts/ada.yml").is_file());
        let manifest = std::fs::read_to_string(base.join("workspace.yaml")).expect("manifest");
        assert!(!manifest.contains("charts/ada.yml"));
    }

    struct FixedSource;

    impl PositionSource for FixedSource {
        fn positions_for(
            &self,
            chart: &ChartInstance,
        ) -> anyhow::Result<IndexMap<String, Position>> {
            if chart.subject.name == "broken" {
                anyhow::bail!("engine unavailable");
            }
            let mut map = IndexMap::new();
            map.insert("sun".to_string(), Position::Longitude(123.4));
            Ok(map)
        }
    }

    #[test]
    fn recompute_maps_failures_to_empty_results() {
        let ws = Workspace {
            charts: vec![chart("Ada", "classic"), chart("broken", "classic")],
            ..Workspace::default()
        };
        let results = recompute_all(&ws, &FixedSource);
        assert_eq!(results.len(), 2);
        assert_eq!(results["Ada"].len(), 1);
        assert!(results["broken"].is_empty());
    }
}
