//! Whole-document narration: request-sized chunks, synthesized in order, audio concatenated.

use std::path::Path;

use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use papervoice_core::{SpokenText, VoiceError, truncate_chars};
use tracing::{info, warn};

use crate::engine::{AudioFormat, TtsProvider};
use crate::request::speak;

/// Group spoken blocks into chunks of at most `max_chars` characters.
///
/// Chunks break at block boundaries; a block that alone exceeds the budget
/// is split between words (or mid-word when a single word is too long).
pub fn chunk_blocks(blocks: &[String], max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for piece in blocks.iter().flat_map(|block| split_block(block, max_chars)) {
        let piece_chars = piece.chars().count();
        let joined = current_chars + usize::from(current_chars > 0) + piece_chars;
        if current_chars > 0 && joined > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(&piece);
        current_chars += piece_chars;
    }
    if current_chars > 0 {
        chunks.push(current);
    }
    chunks
}

fn split_block(block: &str, max_chars: usize) -> Vec<String> {
    let block = block.trim();
    if block.chars().count() <= max_chars {
        return if block.is_empty() { Vec::new() } else { vec![block.to_string()] };
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;
    for word in block.split_whitespace() {
        let mut word = word;
        loop {
            let word_chars = word.chars().count();
            let needed = word_chars + usize::from(current_chars > 0);
            if current_chars + needed <= max_chars {
                if current_chars > 0 {
                    current.push(' ');
                }
                current.push_str(word);
                current_chars += needed;
                break;
            }
            if current_chars > 0 {
                pieces.push(std::mem::take(&mut current));
                current_chars = 0;
                continue;
            }
            // A single word longer than the budget.
            let head = truncate_chars(word, max_chars);
            pieces.push(head.to_string());
            word = &word[head.len()..];
            if word.is_empty() {
                break;
            }
        }
    }
    if current_chars > 0 {
        pieces.push(current);
    }
    pieces
}

/// Synthesize every chunk in order and concatenate the audio.
pub async fn narrate(
    provider: &dyn TtsProvider,
    chunks: &[String],
    format: AudioFormat,
) -> Result<Bytes, VoiceError> {
    if chunks.is_empty() {
        return Err(VoiceError::EmptyInput("narrate"));
    }
    if chunks.len() > 1 && !format.concatenates() {
        warn!(%format, "Concatenated audio in this format may not play past the first chunk");
    }

    let mut audio = BytesMut::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let spoken = SpokenText::new(chunk.as_str());
        let output = speak(provider, &spoken, format).await?;
        info!(chunk = index + 1, of = chunks.len(), bytes = output.audio.len(), "Narrated chunk");
        audio.extend_from_slice(&output.audio);
    }
    Ok(audio.freeze())
}

pub async fn write_audio(path: &Path, audio: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, audio)
        .await
        .with_context(|| format!("Failed to write audio to {}", path.display()))?;
    info!(path = %path.display(), bytes = audio.len(), "Audio written");
    Ok(())
}
