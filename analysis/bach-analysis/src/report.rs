//! analysis/bach-analysis/src/report.rs
//! Accumulated generation diagnostics.
//!
//! Generators never unwind on musical failure: they record issues here and
//! keep going. A Critical entry means the output may be musically
//! unusable; Warning and Info annotate acceptable degradations.

use serde::Serialize;

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailKind {
    Structural,
    Musical,
    Config,
}

/// Severity of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailSeverity {
    Info,
    Warning,
    Critical,
}

/// One recorded issue.
#[derive(Debug, Clone, Serialize)]
pub struct FailIssue {
    pub kind: FailKind,
    pub severity: FailSeverity,
    /// 1-based bar, 0 when not localized.
    pub bar: u32,
    /// 1-based beat within the bar, 0 when not localized.
    pub beat: u8,
    pub voice_a: u8,
    pub voice_b: u8,
    pub rule: String,
    pub description: String,
}

impl FailIssue {
    /// An issue without positional information.
    #[must_use]
    pub fn global(
        kind: FailKind,
        severity: FailSeverity,
        rule: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            bar: 0,
            beat: 0,
            voice_a: 0,
            voice_b: 0,
            rule: rule.into(),
            description: description.into(),
        }
    }
}

/// Severity tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailSummary {
    pub critical: u32,
    pub warning: u32,
    pub info: u32,
}

/// The accumulated diagnostics for one generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FailReport {
    pub issues: Vec<FailIssue>,
}

impl FailReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: FailIssue) {
        self.issues.push(issue);
    }

    /// Count issues per severity.
    #[must_use]
    pub fn summary(&self) -> FailSummary {
        let mut summary = FailSummary::default();
        for issue in &self.issues {
            match issue.severity {
                FailSeverity::Critical => summary.critical += 1,
                FailSeverity::Warning => summary.warning += 1,
                FailSeverity::Info => summary.info += 1,
            }
        }
        summary
    }

    /// Whether any Critical entry is present.
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|issue| issue.severity == FailSeverity::Critical)
    }

    /// Issues of one kind.
    #[must_use]
    pub fn issues_by_kind(&self, kind: FailKind) -> Vec<&FailIssue> {
        self.issues.iter().filter(|issue| issue.kind == kind).collect()
    }

    /// Issues of one severity.
    #[must_use]
    pub fn issues_by_severity(&self, severity: FailSeverity) -> Vec<&FailIssue> {
        self.issues.iter().filter(|issue| issue.severity == severity).collect()
    }

    /// Serialize the report with its summary for the analysis output.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "summary": self.summary(),
            "issues": self.issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_tallies_severities() {
        let mut report = FailReport::new();
        report.add(FailIssue::global(FailKind::Musical, FailSeverity::Warning, "r1", "d1"));
        report.add(FailIssue::global(FailKind::Structural, FailSeverity::Critical, "r2", "d2"));
        report.add(FailIssue::global(FailKind::Musical, FailSeverity::Info, "r3", "d3"));

        let summary = report.summary();
        assert_eq!(summary, FailSummary { critical: 1, warning: 1, info: 1 });
        assert!(report.has_critical());
        assert_eq!(report.issues_by_kind(FailKind::Musical).len(), 2);
        assert_eq!(report.issues_by_severity(FailSeverity::Critical).len(), 1);
    }

    #[test]
    fn json_shape_has_summary_and_issues() {
        let mut report = FailReport::new();
        report.add(FailIssue::global(FailKind::Config, FailSeverity::Info, "rule", "text"));
        let json = report.to_json();
        assert_eq!(json["summary"]["info"], 1);
        assert_eq!(json["issues"][0]["kind"], "config");
        assert_eq!(json["issues"][0]["severity"], "info");
    }
}
