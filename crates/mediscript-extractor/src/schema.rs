//! Response schema and instruction text sent verbatim to the model

use serde_json::{json, Value};

/// System instruction describing the extraction task
pub const EXTRACTION_SYSTEM_INSTRUCTION: &str = r#"You are an advanced medical optical character recognition (OCR) and analysis AI.
Your task is to analyze medical documents (images) and extract specific structured information.
Be precise. If a field is not clearly visible or applicable, leave it null or empty.
Focus on extracting:
1. Patient Info (Name, Age, Sex). Anonymize name if needed, but extract specific age and sex if visible.
2. Diagnosis/Conditions.
3. Prescriptions (Medications, Dosages, Frequencies).
4. Procedures or Operations.
5. Medical History or relevant Medical Report details.
6. Lab Results, Vital Signs, or Test Values."#;

/// User-turn instruction sent alongside the image
pub const EXTRACTION_INSTRUCTION: &str =
    "Extract the medical information from this image according to the schema.";

fn string_field(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn list_field(description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "items": { "type": "STRING" },
        "description": description
    })
}

/// The OBJECT schema the model's JSON answer must follow
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "patientName": string_field("Name of the patient found in the document"),
            "age": string_field("Age of the patient (e.g. '34 years', '2 months')"),
            "sex": string_field("Biological sex or gender of the patient (e.g. 'Male', 'Female')"),
            "diagnosis": string_field("Primary diagnosis or medical condition identified"),
            "prescription": list_field("List of medications, including dosage and frequency"),
            "procedures": list_field("List of medical procedures or operations mentioned"),
            "medicalHistory": list_field("Relevant past medical history or background"),
            "labResults": list_field(
                "List of laboratory results, vital signs, or test findings found in the report"
            ),
            "doctorNotes": string_field("Any specific notes, advice, or remarks from the doctor"),
            "reportDate": string_field("Date of the report or prescription"),
            "rawTextSummary": string_field("A brief summary of the document content")
        }
    })
}
