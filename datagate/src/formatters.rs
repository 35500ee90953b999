//! Formatting validation results for consoles, data docs and machines.

use std::fmt::Write;

use crate::error::Result;
use crate::result::ValidationResult;

/// Configuration options shared by the formatters.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include passing entries, not only failures
    pub include_passing: bool,
    /// Maximum number of per-expectation entries to render (None = all)
    pub max_entries: Option<usize>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_passing: true,
            max_entries: None,
        }
    }
}

impl FormatterConfig {
    /// Creates a configuration rendering failures only.
    pub fn failures_only() -> Self {
        Self {
            include_passing: false,
            max_entries: None,
        }
    }

    /// Caps the number of rendered entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }
}

/// Trait for converting a validation result into an output format.
pub trait ResultFormatter {
    /// Formats a validation result into a string representation.
    fn format(&self, result: &ValidationResult) -> Result<String>;
}

/// Plain-text formatter for console output.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    /// Creates a formatter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a formatter with the given configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, result: &ValidationResult) -> Result<String> {
        let mut out = String::new();
        let verdict = if result.success { "PASSED" } else { "FAILED" };

        writeln!(out, "Validation {verdict}: {}", result.suite_name)?;
        writeln!(out, "Run: {} ({})", result.run_id, result.run_time.to_rfc3339())?;
        writeln!(
            out,
            "Expectations: {} passed, {} failed, {}ms",
            result.passed_count(),
            result.failed_count(),
            result.duration_ms
        )?;

        let mut rendered = 0usize;
        for entry in &result.results {
            if !self.config.include_passing && entry.is_passed() {
                continue;
            }
            if let Some(max) = self.config.max_entries {
                if rendered >= max {
                    writeln!(out, "  … truncated")?;
                    break;
                }
            }
            let mark = if entry.is_passed() { "✓" } else { "✗" };
            let target = entry.column.as_deref().unwrap_or("<table>");
            write!(out, "  {mark} {} on {target}", entry.rule)?;
            if let Some(observed) = entry.observed {
                write!(out, " (observed: {observed})")?;
            }
            if let Some(message) = &entry.message {
                write!(out, " — {message}")?;
            }
            writeln!(out)?;
            rendered += 1;
        }

        Ok(out)
    }
}

/// Markdown formatter used by the data docs builder.
#[derive(Debug, Clone, Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Creates a markdown formatter.
    pub fn new() -> Self {
        Self
    }
}

impl ResultFormatter for MarkdownFormatter {
    fn format(&self, result: &ValidationResult) -> Result<String> {
        let mut out = String::new();
        let badge = if result.success { "✅ passed" } else { "❌ failed" };

        writeln!(out, "# Validation run `{}`", result.run_id)?;
        writeln!(out)?;
        writeln!(out, "- **Suite**: `{}`", result.suite_name)?;
        writeln!(out, "- **Status**: {badge}")?;
        writeln!(out, "- **Run time**: {}", result.run_time.to_rfc3339())?;
        writeln!(
            out,
            "- **Expectations**: {} passed / {} failed",
            result.passed_count(),
            result.failed_count()
        )?;
        writeln!(out)?;
        writeln!(out, "| Expectation | Column | Status | Observed | Detail |")?;
        writeln!(out, "|---|---|---|---|---|")?;
        for entry in &result.results {
            let status = if entry.is_passed() { "pass" } else { "fail" };
            let column = entry.column.as_deref().unwrap_or("—");
            let observed = entry
                .observed
                .map(|v| v.to_string())
                .unwrap_or_else(|| "—".to_string());
            let detail = entry.message.as_deref().unwrap_or("");
            writeln!(
                out,
                "| `{}` | `{column}` | {status} | {observed} | {detail} |",
                entry.rule
            )?;
        }

        Ok(out)
    }
}

/// JSON formatter for machine consumption.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a compact JSON formatter.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Creates a pretty-printing JSON formatter.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, result: &ValidationResult) -> Result<String> {
        let output = if self.pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };
        Ok(output)
    }
}

impl From<std::fmt::Error> for crate::error::GateError {
    fn from(e: std::fmt::Error) -> Self {
        crate::error::GateError::Internal(format!("formatting failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectations::RuleStatus;
    use crate::result::ExpectationResult;
    use chrono::{TimeZone, Utc};

    fn sample_result() -> ValidationResult {
        ValidationResult {
            run_id: "20260807-141502-nightly".to_string(),
            run_time: Utc.with_ymd_and_hms(2026, 8, 7, 14, 15, 2).unwrap(),
            suite_name: "orders_expectations".to_string(),
            success: false,
            results: vec![
                ExpectationResult {
                    rule: "expect_column_values_to_not_be_null".to_string(),
                    column: Some("anio".to_string()),
                    status: RuleStatus::Failed,
                    observed: Some(1.0),
                    message: Some("1 of 3 values in 'anio' are null".to_string()),
                },
                ExpectationResult {
                    rule: "expect_table_row_count_to_be_between".to_string(),
                    column: None,
                    status: RuleStatus::Passed,
                    observed: Some(3.0),
                    message: None,
                },
            ],
            duration_ms: 7,
        }
    }

    #[test]
    fn test_human_format() {
        let output = HumanFormatter::new().format(&sample_result()).unwrap();
        assert!(output.contains("Validation FAILED"));
        assert!(output.contains("1 passed, 1 failed"));
        assert!(output.contains("anio"));
    }

    #[test]
    fn test_human_failures_only() {
        let formatter = HumanFormatter::with_config(FormatterConfig::failures_only());
        let output = formatter.format(&sample_result()).unwrap();
        assert!(output.contains("expect_column_values_to_not_be_null"));
        assert!(!output.contains("expect_table_row_count_to_be_between"));
    }

    #[test]
    fn test_markdown_format_has_table() {
        let output = MarkdownFormatter::new().format(&sample_result()).unwrap();
        assert!(output.starts_with("# Validation run"));
        assert!(output.contains("| `expect_column_values_to_not_be_null` | `anio` | fail |"));
    }

    #[test]
    fn test_json_format_roundtrips() {
        let output = JsonFormatter::new().format(&sample_result()).unwrap();
        let parsed: ValidationResult = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, sample_result());
    }
}
