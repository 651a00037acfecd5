//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};

/// MediScript - Turn a photo of a medical document into a care-plan prompt.
#[derive(Debug, Parser)]
#[command(name = "mediscript")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Google Gemini API key (overrides the profile)
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Prompt text only
    Prompt,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract medical information from a document image
    Extract(ExtractArgs),

    /// Build the care-plan prompt from saved extraction JSON
    Prompt(PromptArgs),

    /// Print the response schema sent to the model
    Schema,

    /// Manage configuration profiles
    Profile(ProfileArgs),

    /// Enter interactive REPL mode
    Repl,
}

/// Arguments for the extract command.
#[derive(Debug, Clone, Parser)]
pub struct ExtractArgs {
    /// Image file (JPEG, PNG, WEBP, HEIC)
    pub image: String,

    /// Model to use instead of the profile's
    #[arg(short, long)]
    pub model: Option<String>,

    /// Extraction settings TOML file
    #[arg(long)]
    pub settings: Option<String>,

    /// Only print the prompt
    #[arg(long)]
    pub prompt_only: bool,

    /// Write the prompt to this file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write the extracted data as JSON to this file
    #[arg(long)]
    pub save_data: Option<String>,
}

/// Arguments for the prompt command.
#[derive(Debug, Parser)]
pub struct PromptArgs {
    /// JSON file with extracted data
    #[arg(short = 'i', long)]
    pub file: Option<String>,

    /// Read extracted data from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Write the prompt to this file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update a profile
    Set {
        /// Profile name
        name: String,
        /// API key stored in the profile
        #[arg(long = "key")]
        key: Option<String>,
        /// Model name
        #[arg(short, long)]
        model: Option<String>,
        /// API base URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Prompt => crate::config::OutputFormat::Prompt,
        }
    }
}
