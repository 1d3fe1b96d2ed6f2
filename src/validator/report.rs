use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;
use serde::Serialize;

/// Validation check result status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed
    Ok,
    /// Check passed with warnings
    Warning(String),
    /// Check failed
    Failed(String),
}

impl CheckStatus {
    fn is_ok(&self) -> bool {
        matches!(self, CheckStatus::Ok)
    }

    fn is_failed(&self) -> bool {
        matches!(self, CheckStatus::Failed(_))
    }

    fn detail(&self) -> Option<&str> {
        match self {
            CheckStatus::Ok => None,
            CheckStatus::Warning(msg) | CheckStatus::Failed(msg) => Some(msg),
        }
    }
}

/// Family a check belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    /// Presence of time, position and pressure
    Mandatory,
    /// Latitude and longitude bounds
    Geographic,
    /// Physical value ranges
    Physical,
    /// QC flag vocabulary
    QcVocabulary,
}

impl CheckCategory {
    /// Snake-case name
    pub fn name(self) -> &'static str {
        match self {
            CheckCategory::Mandatory => "mandatory",
            CheckCategory::Geographic => "geographic",
            CheckCategory::Physical => "physical",
            CheckCategory::QcVocabulary => "qc_vocabulary",
        }
    }
}

/// Individual validation check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "CheckRecord")]
pub struct ValidationCheck {
    /// Name of the validation check
    pub name: String,
    /// Check family
    pub category: CheckCategory,
    /// Result status of the check
    pub status: CheckStatus,
    /// A failure of this check makes the file non-processable
    pub fatal: bool,
}

impl ValidationCheck {
    pub(crate) fn ok(name: impl Into<String>, category: CheckCategory) -> Self {
        Self {
            name: name.into(),
            category,
            status: CheckStatus::Ok,
            fatal: false,
        }
    }

    pub(crate) fn warning(
        name: impl Into<String>,
        category: CheckCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            status: CheckStatus::Warning(message.into()),
            fatal: false,
        }
    }

    pub(crate) fn failed(
        name: impl Into<String>,
        category: CheckCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            status: CheckStatus::Failed(message.into()),
            fatal: false,
        }
    }

    /// Mark the check as fatal when it fails
    pub(crate) fn fatal_on_failure(mut self, fatal: bool) -> Self {
        self.fatal = fatal;
        self
    }

    /// Whether the check did not fail
    pub fn passed(&self) -> bool {
        !self.status.is_failed()
    }

    /// Warning or failure message
    pub fn detail(&self) -> Option<&str> {
        self.status.detail()
    }

    /// Whether the check failed and blocks processing
    pub fn is_fatal_failure(&self) -> bool {
        self.fatal && self.status.is_failed()
    }
}

/// JSON view of a check
#[derive(Serialize)]
struct CheckRecord {
    check_name: String,
    category: CheckCategory,
    passed: bool,
    fatal: bool,
    detail: Option<String>,
}

impl From<ValidationCheck> for CheckRecord {
    fn from(check: ValidationCheck) -> Self {
        Self {
            passed: check.passed(),
            fatal: check.is_fatal_failure(),
            detail: check.status.detail().map(str::to_string),
            check_name: check.name,
            category: check.category,
        }
    }
}

/// QC flag counts per variable: `{"TEMP": {"1": 120, "4": 3, "blank": 7}}`
pub type QcHistogram = BTreeMap<String, BTreeMap<String, u64>>;

/// Complete validation report for an ARGO file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Path of the file that was validated
    pub file_path: String,
    /// List of individual validation check results
    pub checks: Vec<ValidationCheck>,
    /// QC flag distribution of every measurement QC variable
    pub qc_histogram: QcHistogram,
    /// Number of checks that did not fail
    pub passed: usize,
    /// Number of failed checks
    pub failed: usize,
}

impl ValidationReport {
    /// Create a new validation report for the given file path
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            checks: Vec::new(),
            qc_histogram: BTreeMap::new(),
            passed: 0,
            failed: 0,
        }
    }

    /// Add a validation check result to the report
    pub fn add_check(&mut self, check: ValidationCheck) {
        if check.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.checks.push(check);
    }

    /// Check if any validation checks failed
    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status.is_failed())
    }

    /// Check if any validation checks produced warnings
    pub fn has_warnings(&self) -> bool {
        self.checks.iter().any(|c| matches!(c.status, CheckStatus::Warning(_)))
    }

    /// Whether a fatal check failed
    pub fn has_fatal_failures(&self) -> bool {
        self.checks.iter().any(ValidationCheck::is_fatal_failure)
    }

    /// Whether a fatal check of `category` failed
    pub fn has_fatal_failure_in(&self, category: CheckCategory) -> bool {
        self.checks
            .iter()
            .any(|c| c.category == category && c.is_fatal_failure())
    }

    /// Failed checks, fatal or not
    pub fn failures(&self) -> impl Iterator<Item = &ValidationCheck> {
        self.checks.iter().filter(|c| c.status.is_failed())
    }

    /// Whether the preprocessor may run
    pub fn is_processable(&self) -> bool {
        !self.has_fatal_failures()
    }

    /// Check by name
    pub fn check(&self, name: &str) -> Option<&ValidationCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Count the number of successful checks
    pub fn success_count(&self) -> usize {
        self.checks.iter().filter(|c| c.status.is_ok()).count()
    }

    /// Count the number of warnings
    pub fn warning_count(&self) -> usize {
        self.checks.iter().filter(|c| matches!(c.status, CheckStatus::Warning(_))).count()
    }

    /// Count the number of failures
    pub fn failure_count(&self) -> usize {
        self.checks.iter().filter(|c| c.status.is_failed()).count()
    }

    fn verdict(&self) -> &'static str {
        if self.has_fatal_failures() {
            "Validation FAILED (file rejected)"
        } else if self.has_failures() {
            "Validation FAILED (processable, affected values excluded)"
        } else if self.has_warnings() {
            "Validation PASSED with warnings"
        } else {
            "Validation PASSED"
        }
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::Emoji;

            static OK: Emoji<'_, '_> = Emoji("✓", "[OK]");
            static WARN: Emoji<'_, '_> = Emoji("⚠", "[WARN]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();

            output.push_str(&format!("{}\n", style("ARGO Validation Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("======================").cyan()));
            output.push_str(&format!("{}: {}\n\n", style("File").bold(), self.file_path));

            for check in &self.checks {
                let (symbol, color_fn): (_, fn(&str) -> console::StyledObject<&str>) = match &check.status {
                    CheckStatus::Ok => (OK, |s| style(s).green()),
                    CheckStatus::Warning(_) => (WARN, |s| style(s).yellow()),
                    CheckStatus::Failed(_) => (FAIL, |s| style(s).red()),
                };

                output.push_str(&format!("[{}] {}", symbol, color_fn(&check.name)));

                match &check.status {
                    CheckStatus::Ok => output.push('\n'),
                    CheckStatus::Warning(msg) => {
                        output.push_str(&format!(" - {}: {}\n", style("WARNING").yellow().bold(), msg));
                    }
                    CheckStatus::Failed(msg) if check.fatal => {
                        output.push_str(&format!(" - {}: {}\n", style("FATAL").red().bold(), msg));
                    }
                    CheckStatus::Failed(msg) => {
                        output.push_str(&format!(" - {}: {}\n", style("FAILED").red().bold(), msg));
                    }
                }
            }

            output.push('\n');
            output.push_str(&format!(
                "{}: {} passed, {} warnings, {} failed\n",
                style("Summary").bold(),
                style(self.success_count()).green(),
                style(self.warning_count()).yellow(),
                style(self.failure_count()).red()
            ));

            output.push('\n');
            let verdict = if self.has_failures() {
                style(self.verdict()).red().bold()
            } else if self.has_warnings() {
                style(self.verdict()).yellow().bold()
            } else {
                style(self.verdict()).green().bold()
            };
            output.push_str(&format!("{}\n", verdict));

            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ARGO Validation Report")?;
        writeln!(f, "======================")?;
        writeln!(f, "File: {}", self.file_path)?;
        writeln!(f)?;

        for check in &self.checks {
            let symbol = match &check.status {
                CheckStatus::Ok => "✓",
                CheckStatus::Warning(_) => "⚠",
                CheckStatus::Failed(_) => "✗",
            };

            write!(f, "[{}] {}", symbol, check.name)?;

            match &check.status {
                CheckStatus::Ok => writeln!(f)?,
                CheckStatus::Warning(msg) => writeln!(f, " - WARNING: {}", msg)?,
                CheckStatus::Failed(msg) if check.fatal => writeln!(f, " - FATAL: {}", msg)?,
                CheckStatus::Failed(msg) => writeln!(f, " - FAILED: {}", msg)?,
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} passed, {} warnings, {} failed",
            self.success_count(),
            self.warning_count(),
            self.failure_count()
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.verdict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValidationReport {
        let mut report = ValidationReport::new("R1900722_001.nc");
        report.add_check(ValidationCheck::ok("mandatory_field:JULD", CheckCategory::Mandatory));
        report.add_check(ValidationCheck::warning(
            "physical_range:DOXY",
            CheckCategory::Physical,
            "no bounds configured",
        ));
        report.add_check(
            ValidationCheck::failed("latitude_bounds", CheckCategory::Geographic, "1 value outside [-90, 90]")
                .fatal_on_failure(true),
        );
        report
    }

    #[test]
    fn test_counts_and_fatality() {
        let report = sample();
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert_eq!((report.passed, report.failed), (2, 1));
        assert!(report.has_fatal_failures());
        assert!(report.has_fatal_failure_in(CheckCategory::Geographic));
        assert!(!report.has_fatal_failure_in(CheckCategory::Mandatory));
        assert!(!report.is_processable());
    }

    #[test]
    fn test_fatal_flag_needs_failure() {
        let check = ValidationCheck::ok("longitude_bounds", CheckCategory::Geographic).fatal_on_failure(true);
        assert!(!check.is_fatal_failure());
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert!(text.contains("[✓] mandatory_field:JULD"));
        assert!(text.contains("[✗] latitude_bounds - FATAL: 1 value outside [-90, 90]"));
        assert!(text.contains("Summary: 1 passed, 1 warnings, 1 failed"));
        assert!(text.contains("Validation FAILED (file rejected)"));
    }

    #[test]
    fn test_json_view() {
        let json = serde_json::to_value(sample()).unwrap();
        let check = &json["checks"][2];
        assert_eq!(check["check_name"], "latitude_bounds");
        assert_eq!(check["category"], "geographic");
        assert_eq!(check["passed"], false);
        assert_eq!(check["fatal"], true);
        assert_eq!(json["checks"][0]["detail"], serde_json::Value::Null);
        assert_eq!(json["failed"], 1);
    }
}
