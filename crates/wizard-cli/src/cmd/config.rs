use crate::output::print_json;
use clap::Subcommand;
use wizard_core::config::{WarnLevel, WizardConfig};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration (file, then environment and flags)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config: &WizardConfig, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(config, json),
        ConfigSubcommand::Validate => validate(config, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(config: &WizardConfig, json: bool) -> anyhow::Result<()> {
    let api_key = if config.has_api_key() { "set" } else { "not set" };

    if json {
        let mut value = serde_json::to_value(config)?;
        value["api_key"] = serde_json::json!(api_key);
        return print_json(&value);
    }

    let retry = &config.retry;
    println!("Model:          {}", config.model);
    println!("Max tokens:     {}", config.max_tokens);
    println!("API base URL:   {}", config.api_base_url);
    println!("API key:        {api_key}");
    println!("Output dir:     {}", config.output_dir.display());
    println!(
        "Retry:          {} retries, {}ms initial, x{}, {}ms max",
        retry.max_retries, retry.initial_delay_ms, retry.multiplier, retry.max_delay_ms
    );
    println!("Server port:    {}", config.server.port);
    println!(
        "Frontend URL:   {}",
        config.server.frontend_url.as_deref().unwrap_or("(any origin)")
    );
    println!("Mode:           {}", config.server.mode);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config: &WizardConfig, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
