//! Prompt command implementation.

use crate::cli::PromptArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mediscript_domain::ExtractedMedicalData;
use mediscript_extractor::parse_extraction;
use serde_json::Value;
use std::fs;
use std::io::Read;

/// Execute the prompt command.
pub fn execute_prompt(args: PromptArgs, formatter: &Formatter) -> Result<()> {
    let input = match (&args.file, args.stdin) {
        (Some(path), false) => fs::read_to_string(path)?,
        (None, true) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        _ => {
            return Err(CliError::InvalidInput(
                "Provide exactly one of --file or --stdin".to_string(),
            ))
        }
    };

    let data = load_data(&input)?;
    let prompt = formatter.format_prompt(&data);

    match &args.output {
        Some(path) => {
            fs::write(path, &prompt)?;
            println!("{}", formatter.success(&format!("Prompt written to {}", path)));
        }
        None => println!("{}", prompt),
    }

    Ok(())
}

/// Read extracted data saved by `extract --save-data` or a raw model answer.
///
/// Output of `extract --format json` is also accepted; its `data` member is used.
pub fn load_data(input: &str) -> Result<ExtractedMedicalData> {
    if let Ok(Value::Object(mut map)) = serde_json::from_str::<Value>(input) {
        if map.contains_key("metadata") {
            if let Some(data @ Value::Object(_)) = map.remove("data") {
                return Ok(serde_json::from_value(data)?);
            }
        }
    }
    Ok(parse_extraction(input)?)
}
