//! `papervoice narrate`: read a whole markdown paper aloud into one audio file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use papervoice_speech::{NormalizeOptions, Normalizer};
use papervoice_tts::{chunk_blocks, narrate, write_audio};
use tracing::info;

use crate::config::Config;
use crate::normalize_cmd::read_input;
use crate::terminal_output::note_success;

/// Spoken chunks for a document, each within the speech input budget.
pub fn plan_chunks(markdown: &str, options: NormalizeOptions) -> Vec<String> {
    let blocks = Normalizer::new(options).spoken_blocks(markdown);
    chunk_blocks(&blocks, options.max_chars)
}

/// Narration always strips citations; the remaining options come from the config.
fn narration_options(config: &Config) -> NormalizeOptions {
    NormalizeOptions {
        heading_pauses: config.normalize.heading_pauses,
        max_chars: config.normalize.max_chars,
        ..NormalizeOptions::narration()
    }
}

pub async fn run(config: &Config, input: &Path, output: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let markdown = read_input(Some(input)).await?;
    let chunks = plan_chunks(&markdown, narration_options(config));
    if chunks.is_empty() {
        bail!("{} has nothing to read aloud", input.display());
    }
    let chars: usize = chunks.iter().map(|chunk| chunk.chars().count()).sum();
    info!(chunks = chunks.len(), chars, "Narration planned");

    if dry_run {
        for (i, chunk) in chunks.iter().enumerate() {
            println!("--- chunk {} ({} chars)\n{chunk}", i + 1, chunk.chars().count());
        }
        return Ok(());
    }

    let tts = config.tts()?;
    let audio = narrate(tts.as_ref(), &chunks, config.format).await?;
    let output = output.unwrap_or_else(|| input.with_extension(config.format.to_string()));
    write_audio(&output, &audio).await?;
    note_success(&format!(
        "{} chunks → {} ({} bytes)",
        chunks.len(),
        output.display(),
        audio.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use papervoice_config::PaperVoiceConfig;

    #[test]
    fn chunks_respect_the_budget() {
        let paragraph = "We study $\\alpha$ in depth. ".repeat(40);
        let markdown = format!("# Intro\n\n{paragraph}\n\n# Method\n\n{paragraph}");
        let options = NormalizeOptions {
            max_chars: 500,
            ..NormalizeOptions::narration()
        };
        let chunks = plan_chunks(&markdown, options);
        assert!(chunks.len() > 2);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 500));
        assert_eq!(chunks[0], "Intro.");
        assert!(chunks[1].starts_with("We study alpha in depth."));
        assert!(chunks.iter().all(|chunk| !chunk.contains('$')));
    }

    #[test]
    fn narration_strips_citations() {
        let config = Config::from_file(PaperVoiceConfig::default()).unwrap();
        let options = narration_options(&config);
        assert!(options.strip_citations);
        let chunks = plan_chunks("Neural processes [3] work well.", options);
        assert_eq!(chunks, vec!["Neural processes work well."]);
    }

    #[test]
    fn display_math_reads_as_a_pause() {
        let chunks = plan_chunks("$$x^2$$", NormalizeOptions::narration());
        assert_eq!(chunks, vec!["."]);
        assert!(plan_chunks("", NormalizeOptions::narration()).is_empty());
    }
}
