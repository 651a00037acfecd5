//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use mediscript_domain::{AppStatus, ExtractedMedicalData};
use mediscript_extractor::{CarePromptBuilder, ExtractionOutcome, NEXT_STEP_HINT};
use serde_json::Value;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Modify, Style, Width},
};

const NOT_PROVIDED: &str = "Not provided";
const NO_DATA: &str = "No data";
const NOTHING_EXTRACTED: &str = "No medical information extracted";

/// Nested objects with at most this many entries are rendered on one line.
const INLINE_OBJECT_LIMIT: usize = 3;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a finished extraction.
    pub fn format_extraction(&self, outcome: &ExtractionOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
            OutputFormat::Prompt => Ok(self.format_prompt(&outcome.data)),
            OutputFormat::Table => {
                let footer = self.info(&format!(
                    "{} via {} in {} ms",
                    outcome.metadata.source,
                    outcome.metadata.model_name,
                    outcome.metadata.processing_time_ms
                ));
                Ok(format!(
                    "{}\n{}\n\n{}",
                    self.format_card(&outcome.data),
                    footer,
                    self.format_prompt_section(&outcome.data)
                ))
            }
        }
    }

    /// Format extracted data on its own, without metadata.
    pub fn format_data(&self, data: &ExtractedMedicalData) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
            OutputFormat::Prompt => Ok(self.format_prompt(data)),
            OutputFormat::Table => Ok(self.format_card(data)),
        }
    }

    /// Format the data card: one row per extracted field.
    pub fn format_card(&self, data: &ExtractedMedicalData) -> String {
        if data.is_empty() {
            return self.colorize(NOTHING_EXTRACTED, "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, value) in data.entries() {
            builder.push_record([format_key(&key), render_value(&value, 0)]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Columns::last()).with(Width::wrap(72)));

        table.to_string()
    }

    /// The care-plan prompt as plain text.
    pub fn format_prompt(&self, data: &ExtractedMedicalData) -> String {
        CarePromptBuilder::new(data).build()
    }

    /// The prompt framed by a heading and the next-step hint.
    pub fn format_prompt_section(&self, data: &ExtractedMedicalData) -> String {
        format!(
            "{}\n\n{}\n\n{}",
            self.colorize("AI Care Plan Prompt", "cyan"),
            self.format_prompt(data),
            self.info(NEXT_STEP_HINT)
        )
    }

    /// Format a session status label.
    pub fn status(&self, status: AppStatus) -> String {
        let color = match status {
            AppStatus::Idle => "blue",
            AppStatus::Processing => "yellow",
            AppStatus::Complete => "green",
            AppStatus::Error => "red",
        };
        self.colorize(status.as_str(), color)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().bold().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Turn a camelCase or snake_case key into Title Case words.
pub fn format_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Render a field value for the data card.
pub fn render_value(value: &Value, depth: usize) -> String {
    match value {
        Value::Null => NOT_PROVIDED.to_string(),
        Value::String(s) if s.trim().is_empty() => NOT_PROVIDED.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.is_empty() => NO_DATA.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| format!("{}• {}", indent(depth), render_value(item, depth + 1).trim_start()))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) if map.is_empty() => NO_DATA.to_string(),
        Value::Object(map) => {
            // Small nested objects fit on one line; nested values stay compact JSON
            if map.len() <= INLINE_OBJECT_LIMIT && depth > 0 {
                map.iter()
                    .map(|(k, v)| {
                        let text = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        format!("{}: {}", format_key(k), text)
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            } else {
                map.iter()
                    .map(|(k, v)| {
                        let rendered = render_value(v, depth + 1);
                        if rendered.contains('\n') {
                            format!("{}{}:\n{}", indent(depth), format_key(k), rendered)
                        } else {
                            format!("{}{}: {}", indent(depth), format_key(k), rendered)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediscript_extractor::ExtractionMetadata;
    use serde_json::json;

    fn sample() -> ExtractedMedicalData {
        ExtractedMedicalData {
            patient_name: Some("Jane Doe".to_string()),
            diagnosis: Some("Hypertension".to_string()),
            prescription: Some(vec!["Amlodipine 5mg daily".to_string()]),
            ..Default::default()
        }
    }

    fn outcome() -> ExtractionOutcome {
        ExtractionOutcome {
            data: sample(),
            metadata: ExtractionMetadata {
                source: "rx.jpg".to_string(),
                model_name: "mock-vision".to_string(),
                timestamp: 0,
                processing_time_ms: 12,
                response_chars: 80,
            },
        }
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key("patientName"), "Patient Name");
        assert_eq!(format_key("lab_results"), "Lab Results");
        assert_eq!(format_key("rawTextSummary"), "Raw Text Summary");
        assert_eq!(format_key("age"), "Age");
        assert_eq!(format_key("HDL"), "HDL");
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(render_value(&json!(""), 0), "Not provided");
        assert_eq!(render_value(&json!(null), 0), "Not provided");
        assert_eq!(render_value(&json!(true), 0), "Yes");
        assert_eq!(render_value(&json!(false), 0), "No");
        assert_eq!(render_value(&json!(3.5), 0), "3.5");
    }

    #[test]
    fn test_render_collections() {
        assert_eq!(render_value(&json!([]), 0), "No data");
        assert_eq!(render_value(&json!({}), 0), "No data");
        assert_eq!(render_value(&json!(["a", "b"]), 0), "• a\n• b");
    }

    #[test]
    fn test_small_object_inline_only_when_nested() {
        let value = json!({"dose": "5mg", "daily": true});
        assert_eq!(render_value(&value, 0), "Daily: Yes\nDose: 5mg");
        assert_eq!(render_value(&value, 1), "Daily: true; Dose: 5mg");

        let vitals = json!({"pulse": 80, "bp": {"sys": 120}, "tags": ["a"]});
        assert_eq!(
            render_value(&vitals, 1),
            r#"Bp: {"sys":120}; Pulse: 80; Tags: ["a"]"#
        );
    }

    #[test]
    fn test_render_large_object_is_indented() {
        let value = json!({"a": 1, "b": 2, "c": 3, "d": {"e": "x"}});
        let rendered = render_value(&value, 0);
        assert_eq!(rendered.lines().count(), 4);
        assert!(rendered.contains("D: E: x"));

        let top = json!({"vitals": {"pulse": 80}});
        assert_eq!(render_value(&top, 0), "Vitals: Pulse: 80");
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_card(&sample());
        assert!(output.contains("Patient Name"));
        assert!(output.contains("Jane Doe"));
        assert!(output.contains("• Amlodipine 5mg daily"));
    }

    #[test]
    fn test_empty_card() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_card(&ExtractedMedicalData::default());
        assert_eq!(output, "No medical information extracted");
    }

    #[test]
    fn test_extraction_formats() {
        let json = Formatter::new(OutputFormat::Json, false)
            .format_extraction(&outcome())
            .unwrap();
        assert!(json.contains("\"patientName\": \"Jane Doe\""));
        assert!(json.contains("\"model_name\""));

        let prompt = Formatter::new(OutputFormat::Prompt, false)
            .format_extraction(&outcome())
            .unwrap();
        assert!(prompt.starts_with("CONTEXT:"));
        assert!(!prompt.contains(NEXT_STEP_HINT));

        let table = Formatter::new(OutputFormat::Table, false)
            .format_extraction(&outcome())
            .unwrap();
        assert!(table.contains("Primary Diagnosis: Hypertension"));
        assert!(table.contains(NEXT_STEP_HINT));
        assert!(table.contains("rx.jpg via mock-vision"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.status(AppStatus::Error), "ERROR");
    }
}
