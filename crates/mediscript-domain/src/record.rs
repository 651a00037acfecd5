//! Record module - the structured fields extracted from a medical document
//!
//! The remote model is asked for a fixed schema, but nothing forces it to
//! comply. Well-known fields are typed and coerced leniently; any other key is
//! kept verbatim in [`ExtractedMedicalData::extra`] so it can still be shown.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys that carry transport data rather than extracted information
pub const INTERNAL_KEYS: &[&str] = &["fileB64", "mimeType"];

/// Medical information extracted from a single document image
///
/// Every field is optional. Wire names are camelCase, matching the response
/// schema sent to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMedicalData {
    /// Name of the patient
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,

    /// Age of the patient (free text, e.g. "34 years")
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    /// Biological sex or gender
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,

    /// Primary diagnosis or condition
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,

    /// Medications with dosage and frequency
    #[serde(default, deserialize_with = "de_list", skip_serializing_if = "Option::is_none")]
    pub prescription: Option<Vec<String>>,

    /// Procedures or operations
    #[serde(default, deserialize_with = "de_list", skip_serializing_if = "Option::is_none")]
    pub procedures: Option<Vec<String>>,

    /// Relevant past medical history
    #[serde(default, deserialize_with = "de_list", skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<Vec<String>>,

    /// Lab results, vital signs, test values
    #[serde(default, deserialize_with = "de_list", skip_serializing_if = "Option::is_none")]
    pub lab_results: Option<Vec<String>>,

    /// Notes or advice from the doctor
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub doctor_notes: Option<String>,

    /// Date of the report or prescription
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub report_date: Option<String>,

    /// Short summary of the document
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub raw_text_summary: Option<String>,

    /// Keys the model emitted outside the schema, kept as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ExtractedMedicalData {
    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Ordered `(key, value)` pairs for every field that is present
    ///
    /// Typed fields come first in schema order using their wire names, then
    /// extra keys in sorted order. Internal transport keys are skipped.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries = Vec::new();

        let mut push_text = |key: &str, value: &Option<String>| {
            if let Some(text) = value {
                entries.push((key.to_string(), Value::String(text.clone())));
            }
        };
        push_text("patientName", &self.patient_name);
        push_text("age", &self.age);
        push_text("sex", &self.sex);
        push_text("diagnosis", &self.diagnosis);

        let list_value = |items: &[String]| {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        };
        for (key, value) in [
            ("prescription", &self.prescription),
            ("procedures", &self.procedures),
            ("medicalHistory", &self.medical_history),
            ("labResults", &self.lab_results),
        ] {
            if let Some(items) = value {
                entries.push((key.to_string(), list_value(items)));
            }
        }

        for (key, value) in [
            ("doctorNotes", &self.doctor_notes),
            ("reportDate", &self.report_date),
            ("rawTextSummary", &self.raw_text_summary),
        ] {
            if let Some(text) = value {
                entries.push((key.to_string(), Value::String(text.clone())));
            }
        }

        for (key, value) in &self.extra {
            if INTERNAL_KEYS.contains(&key.as_str()) || value.is_null() {
                continue;
            }
            entries.push((key.clone(), value.clone()));
        }

        entries
    }

    /// A text field, only if it has non-blank content
    pub fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// A list field, only if it has at least one item
    pub fn present_list(value: &Option<Vec<String>>) -> Option<&[String]> {
        value.as_deref().filter(|items| !items.is_empty())
    }
}

/// Flatten a JSON value into a single line of text
///
/// Objects become `key: value; key: value`, arrays are joined with `, `.
pub fn inline_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(inline_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| match v {
                Value::Object(_) | Value::Array(_) => format!("{}: {}", k, v),
                _ => format!("{}: {}", k, inline_text(v)),
            })
            .collect::<Vec<_>>()
            .join("; "),
    }
}

fn de_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_null()).map(|v| inline_text(&v)))
}

fn de_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(inline_text)
                .collect(),
        ),
        Some(Value::String(s)) if s.trim().is_empty() => Some(Vec::new()),
        Some(other) => Some(vec![inline_text(&other)]),
    })
}
