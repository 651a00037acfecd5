//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use mediscript_domain::VisionProvider;
use mediscript_extractor::{
    ExtractionConfig, ExtractionOutcome, Extractor, ExtractorError, ImageLoader,
};
use mediscript_llm::GeminiProvider;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    api_key: Option<&str>,
    formatter: &Formatter,
) -> Result<()> {
    let settings = load_settings(args.settings.as_deref(), config, args.model.as_deref())?;
    let extractor = build_extractor(config, api_key, settings)?;

    let outcome = run_extraction(&extractor, Path::new(&args.image)).await?;
    write_outputs(&args, &outcome, formatter)
}

/// Resolve extraction settings.
///
/// A settings file replaces the defaults wholesale, otherwise the active
/// profile picks the model. `--model` overrides both.
pub fn load_settings(
    path: Option<&str>,
    config: &Config,
    model: Option<&str>,
) -> Result<ExtractionConfig> {
    let mut settings = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            ExtractionConfig::from_toml(&contents).map_err(ExtractorError::Config)?
        }
        None => ExtractionConfig {
            model: config.get_active_profile()?.model.clone(),
            ..Default::default()
        },
    };

    if let Some(model) = model {
        settings.model = model.to_string();
    }

    settings.validate().map_err(ExtractorError::Config)?;
    Ok(settings)
}

/// Build an extractor talking to Gemini with the active profile's endpoint.
pub fn build_extractor(
    config: &Config,
    api_key: Option<&str>,
    settings: ExtractionConfig,
) -> Result<Extractor<GeminiProvider>> {
    let key = config
        .resolve_api_key(api_key)
        .ok_or(ExtractorError::MissingApiKey)?;
    let profile = config.get_active_profile()?;

    debug!("Using model '{}' at {}", settings.model, profile.endpoint);
    let provider = GeminiProvider::new(key, settings.model.clone())?
        .with_endpoint(profile.endpoint.clone());

    Ok(Extractor::new(provider, settings))
}

/// Load an image from disk and run it through the extractor.
pub async fn run_extraction<P>(extractor: &Extractor<P>, path: &Path) -> Result<ExtractionOutcome>
where
    P: VisionProvider,
    P::Error: Into<ExtractorError>,
{
    let loader = ImageLoader::new(extractor.config().max_image_bytes);
    let image = loader.load_path(path)?;
    Ok(extractor.extract(image).await?)
}

fn write_outputs(args: &ExtractArgs, outcome: &ExtractionOutcome, formatter: &Formatter) -> Result<()> {
    if let Some(path) = &args.save_data {
        fs::write(path, serde_json::to_string_pretty(&outcome.data)?)?;
        eprintln!("{}", formatter.success(&format!("Extracted data saved to {}", path)));
    }

    if let Some(path) = &args.output {
        fs::write(path, formatter.format_prompt(&outcome.data))?;
        eprintln!("{}", formatter.success(&format!("Prompt written to {}", path)));
    }

    let rendered = if args.prompt_only {
        formatter.format_prompt(&outcome.data)
    } else {
        formatter.format_extraction(outcome)?
    };
    println!("{}", rendered);

    if outcome.data.is_empty() {
        eprintln!(
            "{}",
            formatter.warning("The model found no medical information in this image")
        );
    }

    Ok(())
}
