//! `papervoice sections` and `papervoice explain`: work on a saved paper page.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use papervoice_section::{explainable_sections, parse_html, ExplainableSection, SectionSelector};
use papervoice_tts::write_audio;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::terminal_output::{note_success, render_table, Column};

pub async fn load_sections(page: &Path) -> Result<Vec<ExplainableSection>> {
    let html = tokio::fs::read_to_string(page)
        .await
        .with_context(|| format!("Failed to read {}", page.display()))?;
    Ok(explainable_sections(&parse_html(&html)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SectionRow<'a> {
    #[serde(flatten)]
    section: &'a ExplainableSection,
    chars: usize,
}

pub async fn list(page: &Path, json: bool) -> Result<()> {
    let sections = load_sections(page).await?;
    let rows: Vec<SectionRow<'_>> = sections
        .iter()
        .map(|section| SectionRow {
            section,
            chars: section.text().chars().count(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No explainable sections in {}", page.display());
        return Ok(());
    }

    let columns = [
        Column::right("#"),
        Column::left("Heading").max_width(48),
        Column::left("Id"),
        Column::right("Chars"),
    ];
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.section.index.to_string(),
                row.section.heading.clone(),
                row.section.id.clone().unwrap_or_else(|| "-".to_string()),
                row.chars.to_string(),
            ]
        })
        .collect();
    print!("{}", render_table(&columns, &cells));
    Ok(())
}

fn select(sections: &[ExplainableSection], selector: &SectionSelector) -> Result<ExplainableSection> {
    selector
        .select(sections)
        .cloned()
        .ok_or_else(|| anyhow!("No section {selector} ({} explainable sections found)", sections.len()))
}

pub async fn explain(
    config: &Config,
    page: &Path,
    selector: &SectionSelector,
    output: Option<PathBuf>,
    text_only: bool,
) -> Result<()> {
    let sections = load_sections(page).await?;
    let section = select(&sections, selector)?;
    let text = section.text();
    info!(section = %section.key(), heading = %section.heading, chars = text.chars().count(), "Explaining section");

    let pipeline = config.pipeline()?;
    if text_only {
        let explanation = pipeline.explain_text(&text).await?;
        println!("{}\n", explanation.explanation.trim_end());
        print!("{}", explanation.spoken.as_str());
        return Ok(());
    }

    let audio = pipeline.explain_audio(&section.key(), &text).await?;
    let output = output.unwrap_or_else(|| PathBuf::from(format!("explanation.{}", pipeline.format())));
    write_audio(&output, &audio).await?;
    note_success(&format!(
        "{} → {} ({} bytes)",
        section.heading,
        output.display(),
        audio.len()
    ));
    Ok(())
}
