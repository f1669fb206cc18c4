//! `papervoice config`: inspect and create the config file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use papervoice_config::{apply_all_defaults, load_and_prepare, redact, write_config, PaperVoiceConfig};

use crate::terminal_output::{note_success, note_warn};

/// The prepared config as YAML, secrets masked.
pub fn redacted_yaml(config: &PaperVoiceConfig) -> Result<String> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    serde_yaml::to_string(&redact(&value)).context("Failed to render config as YAML")
}

pub async fn show(path: &Path) -> Result<()> {
    if !path.exists() {
        note_warn(&format!("{} does not exist; showing defaults", path.display()));
    }
    let config = load_and_prepare(path).await?;
    print!("{}", redacted_yaml(&config)?);
    Ok(())
}

/// Write a config with every default spelled out. The API key is left to `OPENAI_API_KEY`.
pub async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(&apply_all_defaults(PaperVoiceConfig::default()), path).await?;
    note_success(&format!("Wrote {}", path.display()));
    Ok(())
}
