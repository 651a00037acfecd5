//! Interactive REPL (Read-Eval-Print Loop) mode.
//!
//! One REPL is one analysis session: an image goes in with `analyze`, the
//! session moves through its statuses, and the result stays available to
//! `show`, `prompt` and `save` until the next `analyze` or `reset`.

use crate::commands::extract::{build_extractor, load_settings};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mediscript_domain::{ImagePayload, Session, VisionProvider};
use mediscript_extractor::{ExtractionConfig, Extractor, ExtractorError, ImageLoader};
use mediscript_llm::GeminiProvider;
use rustyline::error::ReadlineError;
use rustyline::{Config as EditorConfig, DefaultEditor};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Run the interactive REPL.
pub async fn run_repl(config: &Config, api_key: Option<&str>, formatter: &Formatter) -> Result<()> {
    println!(
        "{}",
        formatter.info("MediScript REPL - Type 'help' for commands, 'exit' to quit")
    );
    println!();

    let settings = load_settings(None, config, None)?;
    let mut workbench = match build_extractor(config, api_key, settings.clone()) {
        Ok(extractor) => Workbench::new(extractor),
        // Keep the session usable; every analysis reports the missing key
        Err(CliError::Extraction(ExtractorError::MissingApiKey)) => {
            println!(
                "{}",
                formatter.warning("No API key configured. Set GEMINI_API_KEY or run 'profile set'.")
            );
            let extractor = Extractor::new(GeminiProvider::new("", settings.model.clone())?, settings);
            Workbench::new(extractor).without_api_key()
        }
        Err(e) => return Err(e),
    };

    let editor_config = EditorConfig::builder()
        .max_history_size(config.settings.history_size)
        .map_err(|e| CliError::Config(format!("Invalid history size: {}", e)))?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config).map_err(|e| {
        CliError::Io(std::io::Error::other(format!(
            "Failed to initialize editor: {}",
            e
        )))
    })?;

    let history_path = get_history_path()?;
    let _ = editor.load_history(&history_path);

    loop {
        let prompt = format!("mediscript [{}]> ", workbench.session().status());

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(cmd) => {
                        match workbench.execute(cmd, formatter).await {
                            Ok(output) => println!("{}", output),
                            Err(e) => eprintln!("{}", formatter.error(&e.to_string())),
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        fs::create_dir_all(parent).ok();
    }
    editor.save_history(&history_path).ok();

    Ok(())
}

/// REPL command type.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Help,
    Analyze(String),
    Retry,
    Reset,
    Show,
    Prompt,
    Status,
    Save(String),
}

/// Parse a REPL command line.
pub fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let require_arg = |usage: &str| -> Result<String> {
        if rest.is_empty() {
            Err(CliError::InvalidInput(format!("Usage: {}", usage)))
        } else {
            Ok(rest.to_string())
        }
    };

    match command {
        "" => Err(CliError::InvalidInput("Empty command".to_string())),
        "exit" | "quit" | "q" => Ok(ReplCommand::Exit),
        "help" | "?" => Ok(ReplCommand::Help),
        "analyze" | "upload" => Ok(ReplCommand::Analyze(require_arg("analyze <image path>")?)),
        "retry" => Ok(ReplCommand::Retry),
        "reset" => Ok(ReplCommand::Reset),
        "show" => Ok(ReplCommand::Show),
        "prompt" => Ok(ReplCommand::Prompt),
        "status" => Ok(ReplCommand::Status),
        "save" => Ok(ReplCommand::Save(require_arg("save <file>")?)),
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            command
        ))),
    }
}

/// Session state behind the REPL.
pub struct Workbench<P: VisionProvider> {
    extractor: Extractor<P>,
    loader: ImageLoader,
    session: Session,
    api_key_missing: bool,
}

impl<P> Workbench<P>
where
    P: VisionProvider,
    P::Error: Into<ExtractorError>,
{
    /// Create a workbench with an idle session.
    pub fn new(extractor: Extractor<P>) -> Self {
        let loader = ImageLoader::new(extractor.config().max_image_bytes);
        Self {
            extractor,
            loader,
            session: Session::new(),
            api_key_missing: false,
        }
    }

    /// Mark the provider as unusable: every analysis is rejected before it starts.
    pub fn without_api_key(mut self) -> Self {
        self.api_key_missing = true;
        self
    }

    /// Current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Extraction settings in use.
    pub fn settings(&self) -> &ExtractionConfig {
        self.extractor.config()
    }

    /// Execute a parsed command and return what to print.
    pub async fn execute(&mut self, cmd: ReplCommand, formatter: &Formatter) -> Result<String> {
        match cmd {
            ReplCommand::Analyze(path) => {
                println!("{}", formatter.info("Analyzing document..."));
                self.analyze(&path).await?;
                Ok(self.show(formatter))
            }
            ReplCommand::Retry => {
                let payload = self.session.retry_payload()?;
                println!("{}", formatter.info(&format!("Retrying {}...", payload.label())));
                self.run(payload).await?;
                Ok(self.show(formatter))
            }
            ReplCommand::Reset => {
                self.session.reset();
                Ok(formatter.success("Session reset"))
            }
            ReplCommand::Show => Ok(self.show(formatter)),
            ReplCommand::Prompt => {
                let data = self.completed_data()?;
                Ok(formatter.format_prompt_section(data))
            }
            ReplCommand::Status => Ok(self.status_line(formatter)),
            ReplCommand::Save(path) => {
                let data = self.completed_data()?;
                fs::write(&path, serde_json::to_string_pretty(data)?)?;
                Ok(formatter.success(&format!("Extracted data saved to {}", path)))
            }
            ReplCommand::Exit | ReplCommand::Help => Ok(String::new()),
        }
    }

    /// Load an image and run it through a fresh attempt.
    ///
    /// A file that cannot be used as an image, or a missing API key, puts the
    /// session in the error state without contacting the model.
    pub async fn analyze(&mut self, path: &str) -> Result<()> {
        let loaded = self.loader.load_path(path).and_then(|payload| {
            if self.api_key_missing {
                Err(ExtractorError::MissingApiKey)
            } else {
                Ok(payload)
            }
        });

        match loaded {
            Ok(payload) => self.run(payload).await,
            Err(e) => {
                self.session.reject(e.user_message())?;
                Err(e.into())
            }
        }
    }

    async fn run(&mut self, payload: ImagePayload) -> Result<()> {
        self.session.begin(payload.clone())?;
        debug!("Session processing '{}'", payload.label());

        match self.extractor.extract(payload).await {
            Ok(outcome) => {
                self.session.complete(outcome.data)?;
                Ok(())
            }
            Err(e) => {
                self.session.fail(e.user_message())?;
                Err(e.into())
            }
        }
    }

    fn completed_data(&self) -> Result<&mediscript_domain::ExtractedMedicalData> {
        self.session.data().ok_or_else(|| {
            CliError::InvalidInput(
                "No extracted data yet. Use 'analyze <image path>' first.".to_string(),
            )
        })
    }

    fn show(&self, formatter: &Formatter) -> String {
        match (self.session.data(), self.session.error()) {
            (Some(data), _) => format!(
                "{}\n{}",
                formatter.format_card(data),
                formatter.info("Type 'prompt' for the care-plan prompt or 'save <file>' to keep the data")
            ),
            (None, Some(error)) => format!(
                "{}\n{}",
                formatter.error(error),
                formatter.info("Type 'retry' to try again or 'reset' to start over")
            ),
            (None, None) => formatter.info("No document analyzed yet"),
        }
    }

    fn status_line(&self, formatter: &Formatter) -> String {
        let mut line = format!("Status: {}", formatter.status(self.session.status()));
        if let Some(payload) = self.session.payload() {
            line.push_str(&format!(
                "\nDocument: {} ({}, {} bytes)",
                payload.label(),
                payload.mime_type,
                payload.byte_len
            ));
        }
        line.push_str(&format!("\nModel: {}", self.extractor.provider().model_name()));
        line
    }
}

/// Get the history file path.
fn get_history_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".mediscript").join("history.txt"))
}

/// Print REPL help.
fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  analyze <image path>      Extract medical information from a document image");
    println!("  retry                     Resubmit the last image after a failure");
    println!("  reset                     Clear the session and start over");
    println!("  show                      Show the extracted data or the last error");
    println!("  prompt                    Show the care-plan prompt");
    println!("  status                    Show the session status");
    println!("  save <file>               Save the extracted data as JSON");
    println!("  help, ?                   Show this help");
    println!("  exit, quit, q             Exit the REPL");
    println!();
}
