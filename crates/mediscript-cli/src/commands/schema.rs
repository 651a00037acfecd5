//! Schema command implementation.

use crate::error::Result;
use mediscript_extractor::response_schema;

/// Execute the schema command.
pub fn execute_schema() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&response_schema())?);
    Ok(())
}
