use super::types::Har;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct HarReader;

impl HarReader {
    /// Read and parse a HAR file from the given path
    pub fn from_file(path: &Path) -> Result<Har> {
        tracing::debug!("Reading HAR file from: {}", path.display());

        let file = File::open(path)?;
        let har: Har = serde_json::from_reader(BufReader::new(file))?;

        tracing::debug!(
            "Parsed HAR file with {} pages and {} entries",
            har.log.pages.len(),
            har.log.entries.len()
        );

        Ok(har)
    }

    /// Parse a HAR document from a JSON string
    pub fn from_str(content: &str) -> Result<Har> {
        Ok(serde_json::from_str(content)?)
    }

    /// Check the invariants every converted document upholds
    pub fn validate(har: &Har) -> Result<()> {
        if har.log.version.is_empty() {
            return Err(Error::InvalidStructure("Missing HAR version".to_string()));
        }

        let page_ids: HashSet<&str> = har.log.pages.iter().map(|p| p.id.as_str()).collect();

        for (idx, entry) in har.log.entries.iter().enumerate() {
            if entry.request.method.is_empty() {
                return Err(Error::InvalidStructure(format!(
                    "Entry {} has empty request method",
                    idx
                )));
            }
            if entry.request.url.is_empty() {
                return Err(Error::InvalidStructure(format!(
                    "Entry {} has empty request URL",
                    idx
                )));
            }
            if let Some(page_ref) = &entry.page_ref
                && !page_ids.contains(page_ref.as_str())
            {
                return Err(Error::InvalidStructure(format!(
                    "Entry {} references unknown page {}",
                    idx, page_ref
                )));
            }
        }

        Ok(())
    }
}
