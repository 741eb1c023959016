use std::fmt;
use std::path::PathBuf;

use crate::format::ScanNumber;

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Nothing to report
    Pass,
    /// Readable, but not what a clean conversion produces
    Warn(String),
    /// The artifact is broken
    Fail(String),
}

impl CheckStatus {
    fn marker(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn(_) => "WARN",
            CheckStatus::Fail(_) => "FAIL",
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            CheckStatus::Pass => None,
            CheckStatus::Warn(m) | CheckStatus::Fail(m) => Some(m.as_str()),
        }
    }
}

/// A named check and its outcome
#[derive(Debug, Clone)]
pub struct ValidationCheck {
    /// Check name, stable across runs
    pub name: &'static str,
    /// Outcome
    pub status: CheckStatus,
}

/// What the validator learned about the artifact while reading it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactFacts {
    /// File size in bytes
    pub file_size: u64,
    /// Header scan count, `None` when the header could not be read
    pub declared_scan_count: Option<i32>,
    /// Records decoded before end-of-stream or the first error
    pub records: usize,
    /// Centroid records among them
    pub centroid_records: usize,
    /// Points across all decoded records
    pub points: usize,
    /// Lowest and highest scan number seen
    pub scan_bounds: Option<(ScanNumber, ScanNumber)>,
    /// Instrument model from the metadata sidecar
    pub instrument: Option<String>,
}

impl ArtifactFacts {
    /// Profile records among the decoded records
    pub fn profile_records(&self) -> usize {
        self.records.saturating_sub(self.centroid_records)
    }

    /// Declared scans that have no record
    pub fn missing_records(&self) -> usize {
        self.declared_scan_count
            .map_or(0, |d| (d.max(0) as usize).saturating_sub(self.records))
    }
}

/// Check counts by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Passed checks
    pub passed: usize,
    /// Warnings
    pub warnings: usize,
    /// Failed checks
    pub failed: usize,
}

/// Validation report for one artifact
#[derive(Debug)]
pub struct ValidationReport {
    /// Validated file
    pub path: PathBuf,
    /// Facts gathered along the way
    pub facts: ArtifactFacts,
    /// Checks in the order they ran
    pub checks: Vec<ValidationCheck>,
}

impl ValidationReport {
    /// Empty report for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            facts: ArtifactFacts::default(),
            checks: Vec::new(),
        }
    }

    /// Record the outcome of check `name`
    pub fn record(&mut self, name: &'static str, status: CheckStatus) {
        self.checks.push(ValidationCheck { name, status });
    }

    pub(crate) fn pass(&mut self, name: &'static str) {
        self.record(name, CheckStatus::Pass);
    }

    pub(crate) fn warn(&mut self, name: &'static str, message: impl Into<String>) {
        self.record(name, CheckStatus::Warn(message.into()));
    }

    pub(crate) fn fail(&mut self, name: &'static str, message: impl Into<String>) {
        self.record(name, CheckStatus::Fail(message.into()));
    }

    /// Outcome of check `name`, if it ran
    pub fn status(&self, name: &str) -> Option<&CheckStatus> {
        self.checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.status)
    }

    /// Count checks by outcome
    pub fn tally(&self) -> Tally {
        self.checks
            .iter()
            .fold(Tally::default(), |mut tally, check| {
                match check.status {
                    CheckStatus::Pass => tally.passed += 1,
                    CheckStatus::Warn(_) => tally.warnings += 1,
                    CheckStatus::Fail(_) => tally.failed += 1,
                }
                tally
            })
    }

    /// Whether any check failed
    pub fn has_failures(&self) -> bool {
        self.tally().failed > 0
    }

    /// Whether any check warned
    pub fn has_warnings(&self) -> bool {
        self.tally().warnings > 0
    }

    /// Report text, colored when the `colorized_output` feature is on
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::style;
            self.render(|text, status| match status {
                Some(CheckStatus::Pass) => style(text).green().to_string(),
                Some(CheckStatus::Warn(_)) => style(text).yellow().bold().to_string(),
                Some(CheckStatus::Fail(_)) => style(text).red().bold().to_string(),
                None => style(text).bold().to_string(),
            })
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            self.to_string()
        }
    }

    fn verdict(&self) -> (&'static str, CheckStatus) {
        let tally = self.tally();
        if tally.failed > 0 {
            ("Validation FAILED", CheckStatus::Fail(String::new()))
        } else if tally.warnings > 0 {
            ("Validation PASSED with warnings", CheckStatus::Warn(String::new()))
        } else {
            ("Validation PASSED", CheckStatus::Pass)
        }
    }

    /// Lay out the report; `paint` styles a fragment for its status (`None` for headings)
    fn render(&self, paint: impl Fn(&str, Option<&CheckStatus>) -> String) -> String {
        let facts = &self.facts;
        let path = self.path.display().to_string();
        let mut out = format!("{} ({} bytes)\n", paint(&path, None), facts.file_size);

        if let Some(declared) = facts.declared_scan_count {
            out.push_str(&format!(
                "  {} records for {} declared scans, {} centroid / {} profile, {} points\n",
                facts.records,
                declared,
                facts.centroid_records,
                facts.profile_records(),
                facts.points
            ));
        }
        if let Some((first, last)) = facts.scan_bounds {
            out.push_str(&format!("  scans {}-{}\n", first, last));
        }
        if let Some(instrument) = &facts.instrument {
            out.push_str(&format!("  instrument {}\n", instrument));
        }
        out.push('\n');

        for check in &self.checks {
            let marker = paint(check.status.marker(), Some(&check.status));
            out.push_str(&format!("  {} {}", marker, check.name));
            if let Some(message) = check.status.message() {
                out.push_str(&format!(": {}", message));
            }
            out.push('\n');
        }

        let tally = self.tally();
        let (verdict, status) = self.verdict();
        out.push_str(&format!(
            "\n{} ({} passed, {} warnings, {} failed)\n",
            paint(verdict, Some(&status)),
            tally.passed,
            tally.warnings,
            tally.failed
        ));
        out
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|text, _| text.to_string()))
    }
}
