use crate::entry::EntryRecord;
use crate::options::ConvertOptions;
use crate::page::PageRecord;
use harvest_core::har::{Creator, Entry, Har, Page};

/// The tool named in every emitted document
pub fn creator() -> Creator {
    Creator {
        name: "harvest".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        comment: Some(env!("CARGO_PKG_REPOSITORY").to_string()),
    }
}

/// Prune cache hits and incomplete exchanges, then assemble the document in
/// insertion order
pub(crate) fn finalize(
    pages: Vec<PageRecord>,
    entries: Vec<EntryRecord>,
    options: &ConvertOptions,
) -> Har {
    let recorded = entries.len();

    let entries: Vec<Entry> = entries
        .into_iter()
        .filter(|record| {
            let keep = options.include_cache_served_resources || !record.is_cache_served();
            if !keep {
                tracing::debug!("Dropping cache-served request: {}", record.url());
            }
            keep
        })
        .filter(|record| {
            if !record.is_complete() {
                tracing::debug!("Dropping incomplete request: {}", record.url());
            }
            record.is_complete()
        })
        .filter_map(EntryRecord::into_entry)
        .collect();

    let pages: Vec<Page> = pages.into_iter().map(PageRecord::into_page).collect();

    tracing::info!(
        "Built {} pages and {} entries from {} recorded requests",
        pages.len(),
        entries.len(),
        recorded
    );

    Har::new(creator(), pages, entries)
}
