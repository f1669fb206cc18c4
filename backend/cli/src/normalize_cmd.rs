//! `papervoice normalize` and `papervoice render`: offline views of a markdown answer.

use std::path::Path;

use anyhow::{Context, Result};
use papervoice_markdown::{IrParser, RenderOptions, Renderer};
use papervoice_speech::{NormalizeOptions, Normalizer};
use tokio::io::AsyncReadExt;

/// Read a file, or stdin when no path (or `-`) is given.
pub async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

pub async fn run(path: Option<&Path>, options: NormalizeOptions) -> Result<()> {
    let markdown = read_input(path).await?;
    let spoken = Normalizer::new(options).normalize(&markdown);
    print!("{}", spoken.as_str());
    Ok(())
}

pub async fn render(path: Option<&Path>, options: RenderOptions) -> Result<()> {
    let markdown = read_input(path).await?;
    println!("{}", Renderer::to_html(&IrParser::parse(&markdown), options));
    Ok(())
}
