use super::types::Har;
use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct HarWriter;

impl HarWriter {
    /// Write a HAR document to a file, pretty-printed unless `compact`
    pub fn to_file(har: &Har, path: &Path, compact: bool) -> Result<()> {
        tracing::debug!("Writing HAR file to: {}", path.display());

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::to_writer(har, &mut writer, compact)?;
        writer.flush()?;

        tracing::info!(
            "Wrote {} pages and {} entries to {}",
            har.log.pages.len(),
            har.log.entries.len(),
            path.display()
        );

        Ok(())
    }

    /// Serialize a HAR document into any writer, followed by a newline
    pub fn to_writer<W: Write>(har: &Har, writer: &mut W, compact: bool) -> Result<()> {
        if compact {
            serde_json::to_writer(&mut *writer, har)?;
        } else {
            serde_json::to_writer_pretty(&mut *writer, har)?;
        }
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Convert a HAR document to a pretty JSON string
    pub fn to_string(har: &Har) -> Result<String> {
        Ok(serde_json::to_string_pretty(har)?)
    }

    /// Convert a HAR document to a compact JSON string
    pub fn to_string_compact(har: &Har) -> Result<String> {
        Ok(serde_json::to_string(har)?)
    }
}
