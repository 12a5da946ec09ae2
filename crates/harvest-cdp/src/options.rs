use serde::{Deserialize, Serialize};

/// Knobs accepted by the converter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Keep entries answered from the disk or back-forward cache
    pub include_cache_served_resources: bool,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_served_resources(mut self, include: bool) -> Self {
        self.include_cache_served_resources = include;
        self
    }
}
