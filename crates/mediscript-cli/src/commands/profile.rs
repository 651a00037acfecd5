//! Profile command implementation.

use crate::cli::{ProfileAction, ProfileArgs};
use crate::config::{Config, Profile};
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the profile command.
pub fn execute_profile(args: ProfileArgs, config: &mut Config, formatter: &Formatter) -> Result<()> {
    match args.action {
        ProfileAction::List => list_profiles(config, formatter),
        ProfileAction::Show => show_active_profile(config, formatter),
        ProfileAction::Switch { name } => switch_profile(config, name, formatter),
        ProfileAction::Set {
            name,
            key,
            model,
            endpoint,
        } => set_profile(config, name, key, model, endpoint, formatter),
        ProfileAction::Delete { name } => delete_profile(config, name, formatter),
    }
}

/// Show a key without revealing it.
fn mask_key(key: Option<&str>) -> String {
    match key {
        None => "(not set)".to_string(),
        Some(key) => {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() <= 8 {
                return "****".to_string();
            }
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}…{}", head, tail)
        }
    }
}

fn print_profile(profile: &Profile, indent: &str) {
    println!("{}Model: {}", indent, profile.model);
    println!("{}Endpoint: {}", indent, profile.endpoint);
    println!("{}API key: {}", indent, mask_key(profile.api_key.as_deref()));
}

/// List all profiles.
fn list_profiles(config: &Config, formatter: &Formatter) -> Result<()> {
    if config.profiles.is_empty() {
        println!("{}", formatter.info("No profiles configured"));
        return Ok(());
    }

    let mut names: Vec<&String> = config.profiles.keys().collect();
    names.sort();

    println!("Available profiles:");
    for name in names {
        let active = name == &config.active_profile;
        if active {
            println!("* {}", formatter.success(name));
        } else {
            println!("  {}", name);
        }
        print_profile(&config.profiles[name], "    ");
    }

    Ok(())
}

/// Show the active profile.
fn show_active_profile(config: &Config, formatter: &Formatter) -> Result<()> {
    let profile = config.get_active_profile()?;

    println!("Active profile: {}", formatter.success(&config.active_profile));
    print_profile(profile, "  ");

    Ok(())
}

/// Switch to a different profile.
fn switch_profile(config: &mut Config, name: String, formatter: &Formatter) -> Result<()> {
    config.switch_profile(name.clone())?;
    config.save()?;
    println!(
        "{}",
        formatter.success(&format!("Switched to profile '{}'", name))
    );
    Ok(())
}

/// Create or update a profile. Unset options keep their current value.
fn set_profile(
    config: &mut Config,
    name: String,
    key: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    formatter: &Formatter,
) -> Result<()> {
    let existing = config.profiles.get(&name).cloned();
    let action = if existing.is_some() { "Updated" } else { "Created" };

    let mut profile = existing.unwrap_or_default();
    if let Some(key) = key {
        let key = key.trim().to_string();
        profile.api_key = (!key.is_empty()).then_some(key);
    }
    if let Some(model) = model {
        profile.model = model;
    }
    if let Some(endpoint) = endpoint {
        profile.endpoint = endpoint;
    }

    config.set_profile(name.clone(), profile);
    config.save()?;

    println!(
        "{}",
        formatter.success(&format!("{} profile '{}'", action, name))
    );

    Ok(())
}

/// Delete a profile.
fn delete_profile(config: &mut Config, name: String, formatter: &Formatter) -> Result<()> {
    if name == config.active_profile {
        return Err(CliError::NotPermitted(
            "Cannot delete the active profile".to_string(),
        ));
    }

    if config.profiles.remove(&name).is_some() {
        config.save()?;
        println!(
            "{}",
            formatter.success(&format!("Deleted profile '{}'", name))
        );
    } else {
        println!(
            "{}",
            formatter.warning(&format!("Profile '{}' does not exist", name))
        );
    }

    Ok(())
}
