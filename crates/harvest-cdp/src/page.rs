use crate::timing::{elapsed_millis, iso_timestamp};
use harvest_core::har::{Page, PageTimings};

/// Clock readings taken from the first request of a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageStart {
    /// Monotonic seconds
    pub timestamp: f64,
    /// Wall-clock seconds since the epoch
    pub wall_time: f64,
    /// Position of the page's primary request in the entry list
    pub primary_entry: usize,
}

/// A page under construction: the emitted [`Page`] plus what is only needed
/// while correlating
#[derive(Debug, Clone)]
pub struct PageRecord {
    page: Page,
    frame_id: String,
    start: Option<PageStart>,
}

impl PageRecord {
    pub fn new(id: String, frame_id: String) -> Self {
        Self {
            page: Page {
                started_date_time: String::new(),
                id,
                title: String::new(),
                page_timings: PageTimings::default(),
            },
            frame_id,
            start: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.page.id
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    pub fn start(&self) -> Option<&PageStart> {
        self.start.as_ref()
    }

    pub fn is_primary(&self, entry: usize) -> bool {
        self.start.is_some_and(|start| start.primary_entry == entry)
    }

    /// Fix start time and title from the first request routed here.
    /// Returns false when the page was already stamped.
    pub fn stamp(&mut self, entry: usize, timestamp: f64, wall_time: f64, url: &str) -> bool {
        if self.start.is_some() {
            return false;
        }

        self.start = Some(PageStart {
            timestamp,
            wall_time,
            primary_entry: entry,
        });
        self.page.started_date_time = iso_timestamp(wall_time);
        self.page.title = url.to_string();
        true
    }

    pub fn record_on_load(&mut self, timestamp: f64) {
        if let Some(start) = self.start {
            self.page.page_timings.on_load = Some(elapsed_millis(start.timestamp, timestamp));
        }
    }

    pub fn record_dom_content_loaded(&mut self, timestamp: f64) {
        if let Some(start) = self.start {
            self.page.page_timings.on_content_load =
                Some(elapsed_millis(start.timestamp, timestamp));
        }
    }

    pub fn into_page(self) -> Page {
        self.page
    }
}
