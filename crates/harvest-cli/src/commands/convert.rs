use anyhow::{Context, Result};
use harvest_cdp::{ConvertOptions, har_from_events, read_events};
use harvest_core::har::{Har, HarWriter};
use std::io;
use std::path::Path;

/// Read a recorded event stream and convert it into a HAR document
pub fn convert_file(input: &Path, options: &ConvertOptions) -> Result<Har> {
    tracing::debug!("Reading events from: {}", input.display());

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read event file {}", input.display()))?;
    let events = read_events(&text)
        .with_context(|| format!("Failed to parse event file {}", input.display()))?;

    tracing::debug!("Read {} events", events.len());

    let har = har_from_events(&events, options)
        .with_context(|| format!("Failed to convert events from {}", input.display()))?;
    Ok(har)
}

pub fn execute(
    input: &Path,
    output: Option<&Path>,
    options: &ConvertOptions,
    compact: bool,
) -> Result<()> {
    tracing::info!("Converting events from: {}", input.display());

    let har = convert_file(input, options)?;

    match output {
        Some(path) => {
            HarWriter::to_file(&har, path, compact)
                .with_context(|| format!("Failed to write HAR file {}", path.display()))?;
            print_summary(&har, path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            HarWriter::to_writer(&har, &mut stdout, compact)?;
        }
    }

    Ok(())
}

fn print_summary(har: &Har, path: &Path) {
    use console::style;

    println!("\n{}", style("HAR written").bold().green());
    println!("  File:    {}", style(path.display()).cyan());
    println!("  Pages:   {}", har.log.pages.len());
    println!("  Entries: {}", har.log.entries.len());

    for page in &har.log.pages {
        let count = har
            .log
            .entries
            .iter()
            .filter(|e| e.page_ref.as_deref() == Some(page.id.as_str()))
            .count();
        let title = if page.title.is_empty() {
            style("(no requests)".to_string()).dim()
        } else {
            style(page.title.clone())
        };
        println!("    {} {} [{} entries]", style(&page.id).bold(), title, count);
    }

    println!();
}
