//! Cross-reference validation against a model catalog.
//!
//! Validation is a read-only report: findings are returned as data and
//! never abort anything. Warnings mark references to unknown identifiers;
//! the single error condition is the absence of a usable active model,
//! which short-circuits the remaining checks because nothing can be
//! validated without one.

use std::fmt;

use starfisher_domain::{ModelCatalog, Workspace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warn",
            Severity::Error => "error",
        }
    }
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity.as_str(), self.message)
    }
}

/// Checks every cross-reference in the aggregate against the catalog's
/// identifier sets for the active model.
#[must_use]
pub fn validate_workspace(ws: &Workspace, catalog: &dyn ModelCatalog) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let Some(model_name) = ws.active_model_name() else {
        issues.push(ValidationIssue::error("workspace has no active model"));
        return issues;
    };
    let Some(model) = catalog.model(model_name) else {
        issues.push(ValidationIssue::error(format!(
            "active model '{model_name}' is not in the catalog"
        )));
        return issues;
    };

    check_ids(
        &mut issues,
        ws.default.default_bodies.as_deref().unwrap_or_default(),
        &model.body_ids,
        "default body list",
    );
    check_ids(
        &mut issues,
        ws.default.default_aspects.as_deref().unwrap_or_default(),
        &model.aspect_ids,
        "default aspect list",
    );
    check_ids(&mut issues, &ws.aspects, &model.aspect_ids, "aspect overrides");

    for chart in &ws.charts {
        let identity = chart.identity();
        for point in &chart.config.included_points {
            if !model.body_ids.contains(point) {
                issues.push(ValidationIssue::warning(format!(
                    "chart '{identity}' includes unknown body id '{point}'"
                )));
            }
        }
        for aspect in chart.config.aspect_orbs.keys() {
            if !model.aspect_ids.contains(aspect) {
                issues.push(ValidationIssue::warning(format!(
                    "chart '{identity}' overrides orb for unknown aspect id '{aspect}'"
                )));
            }
        }
    }

    for layout in &ws.layouts {
        for reference in &layout.chart_instances {
            if ws.find_chart(reference).is_none() {
                issues.push(ValidationIssue::warning(format!(
                    "layout '{}' references unknown chart '{reference}'",
                    layout.name
                )));
            }
        }
    }

    issues
}

fn check_ids(
    issues: &mut Vec<ValidationIssue>,
    used: &[String],
    known: &std::collections::BTreeSet<String>,
    context: &str,
) {
    for id in used {
        if !known.contains(id) {
            issues.push(ValidationIssue::warning(format!(
                "{context} references unknown id '{id}'"
            )));
        }
    }
}

/// Renders findings one per line, for logs and command output.
#[must_use]
pub fn validation_report(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// True when no finding carries error severity.
#[must_use]
pub fn is_usable(issues: &[ValidationIssue]) -> bool {
    issues.iter().all(|issue| issue.severity != Severity::Error)
}
