//! Care-plan prompt pre-filled with extracted data

use mediscript_domain::ExtractedMedicalData;

/// Shown after the prompt to tell the user what to do with it
pub const NEXT_STEP_HINT: &str = "Copy the prompt above and paste it into ChatGPT, Claude, or Gemini to generate a personalized caregiver guide.";

const PREAMBLE: &[&str] = &[
    "CONTEXT: I have extracted the following medical information from a document/report.",
    "ROLE: Act as a highly experienced clinical medical assistant and patient advocate.",
    "TASK: Analyze the provided data and generate a comprehensive care plan.",
];

const DATA_HEADER: &str = "\n--- EXTRACTED MEDICAL DATA ---";
const DATA_FOOTER: &str = "------------------------------";

const RESPONSE_REQUIREMENTS: &[&str] = &[
    "\nRESPONSE REQUIREMENTS:",
    "Please provide a structured response with the following sections:",
    "1. ✅ USAGE GUIDELINES: Detailed instructions for medications and treatments mentioned.",
    "2. ⚠️ LIMITATIONS & CONTRAINDICATIONS: What to strictly avoid (foods, activities, drug interactions).",
    "3. 🔔 IMPORTANT SAFETY NOTES: Warning signs to watch for that require immediate medical attention.",
    "4. 📋 CAREGIVER'S ACTION PLAN: A step-by-step daily checklist for the caregiver to ensure patient safety and recovery.",
    "5. 🥗 LIFESTYLE & DIETARY RECOMMENDATIONS: Supportive measures based on the diagnosis.",
];

/// Builds the prompt the user pastes into a chat assistant
pub struct CarePromptBuilder<'a> {
    data: &'a ExtractedMedicalData,
}

impl<'a> CarePromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(data: &'a ExtractedMedicalData) -> Self {
        Self { data }
    }

    /// Lines of the data block, one per populated field
    pub fn data_lines(&self) -> Vec<String> {
        let d = self.data;
        let text = |label: &str, value: &Option<String>| {
            ExtractedMedicalData::present(value).map(|v| format!("{}: {}", label, v))
        };
        let list = |label: &str, value: &Option<Vec<String>>, sep: &str| {
            ExtractedMedicalData::present_list(value)
                .map(|items| format!("{}: {}", label, items.join(sep)))
        };

        [
            text("Patient Name", &d.patient_name),
            text("Age", &d.age),
            text("Sex", &d.sex),
            text("Report Date", &d.report_date),
            text("Primary Diagnosis", &d.diagnosis),
            list("Medications", &d.prescription, ", "),
            list("Lab Results/Vitals", &d.lab_results, "; "),
            list("Procedures", &d.procedures, ", "),
            list("Medical History", &d.medical_history, ", "),
            text("Doctor Notes", &d.doctor_notes),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut lines: Vec<String> = PREAMBLE.iter().map(|s| s.to_string()).collect();

        lines.push(DATA_HEADER.to_string());
        lines.extend(self.data_lines());
        lines.push(DATA_FOOTER.to_string());

        lines.extend(RESPONSE_REQUIREMENTS.iter().map(|s| s.to_string()));

        lines.join("\n")
    }
}
