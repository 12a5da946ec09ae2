use crate::entry::EntryRecord;
use crate::event::{CdpEvent, Event};
use crate::finalize::finalize;
use crate::frames::FrameTree;
use crate::options::ConvertOptions;
use crate::page::PageRecord;
use crate::protocol::{
    DataReceived, FrameAttached, FrameStartedLoading, LoadingFailed, LoadingFinished,
    PageMilestone, RequestServedFromCache, RequestWillBeSent, ResourceChangedPriority,
    ResponseReceived,
};
use crate::{Error, Result};
use harvest_core::har::Har;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref SUPPORTED_SCHEME: Regex = Regex::new(r"(?i)^https?:").unwrap();
}

/// Appended to the identifier of a request superseded by a redirect
const REDIRECT_MARKER: char = 'r';

/// All state accumulated while folding over an event stream.
///
/// Feed events in arrival order with [`Session::process`], then call
/// [`Session::finish`] to obtain the document.
#[derive(Debug)]
pub struct Session {
    options: ConvertOptions,
    pages: Vec<PageRecord>,
    current_page: Option<usize>,
    entries: Vec<EntryRecord>,
    /// Live request id to position in `entries`
    by_request_id: HashMap<String, usize>,
    /// Frames that issued at least one request
    request_frames: HashSet<String>,
    frames: FrameTree,
    ignored: HashSet<String>,
}

impl Session {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            pages: Vec::new(),
            current_page: None,
            entries: Vec::new(),
            by_request_id: HashMap::new(),
            request_frames: HashSet::new(),
            frames: FrameTree::new(),
            ignored: HashSet::new(),
        }
    }

    /// Apply one event. `index` is its position in the stream and only
    /// serves to identify it if processing fails.
    pub fn process(&mut self, index: usize, event: &Event) -> Result<()> {
        self.apply(event).map_err(|source| {
            tracing::warn!(
                "Aborting on event #{} ({}): {}",
                index,
                event.method,
                source
            );
            tracing::debug!("Offending payload: {}", event.params);
            Error::Event {
                index,
                method: event.method.clone(),
                source: Box::new(source),
            }
        })
    }

    /// Filter and assemble the accumulated pages and entries
    pub fn finish(self) -> Har {
        finalize(self.pages, self.entries, &self.options)
    }

    fn apply(&mut self, event: &Event) -> Result<()> {
        match event.decode()? {
            CdpEvent::FrameStartedLoading(params) => self.on_frame_started_loading(&params),
            CdpEvent::FrameAttached(params) => self.on_frame_attached(&params),
            CdpEvent::LoadEventFired(params) => self.on_load_event(&params),
            CdpEvent::DomContentEventFired(params) => self.on_dom_content_event(&params),
            CdpEvent::RequestWillBeSent(params) => self.on_request_will_be_sent(&params)?,
            CdpEvent::RequestServedFromCache(params) => self.on_served_from_cache(&params),
            CdpEvent::ResponseReceived(params) => self.on_response_received(&params),
            CdpEvent::DataReceived(params) => self.on_data_received(&params),
            CdpEvent::LoadingFinished(params) => self.on_loading_finished(&params),
            CdpEvent::LoadingFailed(params) => self.on_loading_failed(&params),
            CdpEvent::ResourceChangedPriority(params) => self.on_priority_changed(&params),
            CdpEvent::Ignored => {}
            CdpEvent::Unknown => tracing::debug!("Unhandled event: {}", event.method),
        }
        Ok(())
    }

    fn on_frame_started_loading(&mut self, params: &FrameStartedLoading) {
        let frame_id = &params.frame_id;
        if self.frames.is_subframe(frame_id) || self.request_frames.contains(frame_id) {
            tracing::debug!("Frame {} reloading inside an existing page", frame_id);
            return;
        }

        let page_id = format!("page_{}", self.pages.len() + 1);
        tracing::debug!("Frame {} starts {}", frame_id, page_id);
        self.pages.push(PageRecord::new(page_id, frame_id.clone()));
        self.current_page = Some(self.pages.len() - 1);
    }

    fn on_frame_attached(&mut self, params: &FrameAttached) {
        self.frames.attach(&params.frame_id, &params.parent_frame_id);
    }

    fn on_load_event(&mut self, params: &PageMilestone) {
        if let (Some(page), Some(timestamp)) = (self.current_page_mut(), params.timestamp) {
            page.record_on_load(timestamp);
        }
    }

    fn on_dom_content_event(&mut self, params: &PageMilestone) {
        if let (Some(page), Some(timestamp)) = (self.current_page_mut(), params.timestamp) {
            page.record_dom_content_loaded(timestamp);
        }
    }

    fn on_request_will_be_sent(&mut self, params: &RequestWillBeSent) -> Result<()> {
        let request_id = &params.request_id;
        if self.pages.is_empty() {
            tracing::debug!("Request {} sent before any page, skipping", request_id);
            return Ok(());
        }

        let Some(page_index) = self.owning_page(params.frame_id.as_deref()) else {
            tracing::debug!(
                "Request {} from frame {:?} can't be mapped to any page",
                request_id,
                params.frame_id
            );
            return Ok(());
        };

        if !SUPPORTED_SCHEME.is_match(&params.request.url) {
            tracing::debug!("Ignoring unsupported URL {}", params.request.url);
            self.ignored.insert(request_id.clone());
            return Ok(());
        }

        let entry = EntryRecord::from_request(params, page_index, self.pages[page_index].id())?;

        match &params.redirect_response {
            Some(redirect) => match self.retire(request_id) {
                Some(previous) => {
                    let page = &self.pages[self.entries[previous].page_index];
                    let is_primary = page.is_primary(previous);
                    self.entries[previous].populate_response(redirect, page, is_primary);
                }
                None => tracing::debug!(
                    "Couldn't find original request for redirect response: {}",
                    request_id
                ),
            },
            None => {
                if self.retire(request_id).is_some() {
                    tracing::debug!("Request id {} reused, retiring the earlier entry", request_id);
                }
            }
        }

        let position = self.entries.len();
        if let Some(frame_id) = &params.frame_id {
            self.request_frames.insert(frame_id.clone());
        }
        self.by_request_id.insert(request_id.clone(), position);
        self.entries.push(entry);

        let page = &mut self.pages[page_index];
        if page.stamp(position, params.timestamp, params.wall_time, &params.request.url) {
            tracing::debug!("{} starts with {}", page.id(), params.request.url);
        }
        Ok(())
    }

    fn on_served_from_cache(&mut self, params: &RequestServedFromCache) {
        if let Some(position) = self.live_entry(&params.request_id, "requestServedFromCache") {
            self.entries[position].mark_served_from_cache();
        }
    }

    fn on_response_received(&mut self, params: &ResponseReceived) {
        let Some(position) = self.live_entry(&params.request_id, "responseReceived") else {
            return;
        };

        let page = &self.pages[self.entries[position].page_index];
        let is_primary = page.is_primary(position);
        self.entries[position].populate_response(&params.response, page, is_primary);
    }

    fn on_data_received(&mut self, params: &DataReceived) {
        if let Some(position) = self.live_entry(&params.request_id, "dataReceived") {
            self.entries[position].add_received_data(params.data_length);
        }
    }

    fn on_loading_finished(&mut self, params: &LoadingFinished) {
        if self.ignored.remove(&params.request_id) {
            return;
        }
        if let Some(position) = self.live_entry(&params.request_id, "loadingFinished") {
            self.entries[position].finish(params);
        }
    }

    fn on_loading_failed(&mut self, params: &LoadingFailed) {
        if self.ignored.remove(&params.request_id) {
            return;
        }
        if let Some(position) = self.live_entry(&params.request_id, "loadingFailed") {
            tracing::debug!(
                "Failed to load {} ({}, canceled: {})",
                self.entries[position].url(),
                params.error_text,
                params.canceled
            );
        }
    }

    fn on_priority_changed(&mut self, params: &ResourceChangedPriority) {
        if let Some(position) = self.live_entry(&params.request_id, "resourceChangedPriority") {
            self.entries[position].set_priority(&params.new_priority);
        }
    }

    /// Position of the live entry for a request-scoped event, if the event
    /// should be applied at all
    fn live_entry(&self, request_id: &str, event: &str) -> Option<usize> {
        if self.pages.is_empty() {
            tracing::debug!("{} for {} before any page, skipping", event, request_id);
            return None;
        }
        if self.ignored.contains(request_id) {
            return None;
        }

        let position = self.by_request_id.get(request_id).copied();
        if position.is_none() {
            tracing::debug!(
                "Received {} for requestId {} with no matching request",
                event,
                request_id
            );
        }
        position
    }

    /// Rename the live entry using `request_id` so the id is free again.
    /// Returns its position.
    fn retire(&mut self, request_id: &str) -> Option<usize> {
        let position = self.by_request_id.remove(request_id)?;

        let mut retired = format!("{}{}", request_id, REDIRECT_MARKER);
        while self.by_request_id.contains_key(&retired) {
            retired.push(REDIRECT_MARKER);
        }

        self.entries[position].request_id = retired.clone();
        self.by_request_id.insert(retired, position);
        Some(position)
    }

    fn owning_page(&self, frame_id: Option<&str>) -> Option<usize> {
        let root = self.frames.root_of(frame_id?);
        self.pages.iter().rposition(|page| page.frame_id() == root)
    }

    fn current_page_mut(&mut self) -> Option<&mut PageRecord> {
        self.current_page.and_then(|index| self.pages.get_mut(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(session: &mut Session, events: &[Event]) {
        for (index, event) in events.iter().enumerate() {
            session.process(index, event).unwrap();
        }
    }

    fn request(id: &str, frame: &str, url: &str) -> Event {
        Event::new(
            "Network.requestWillBeSent",
            json!({
                "requestId": id,
                "frameId": frame,
                "timestamp": 1.0,
                "wallTime": 1_700_000_000.0,
                "request": {"url": url, "method": "GET", "headers": {}}
            }),
        )
    }

    #[test]
    fn test_requests_before_any_page_are_skipped() {
        let mut session = Session::new(ConvertOptions::default());
        run(&mut session, &[request("1", "F1", "http://a/")]);
        assert!(session.entries.is_empty());
    }

    #[test]
    fn test_subframe_requests_route_to_root_page() {
        let mut session = Session::new(ConvertOptions::default());
        run(
            &mut session,
            &[
                Event::new("Page.frameStartedLoading", json!({"frameId": "F1"})),
                Event::new("Page.frameAttached", json!({"frameId": "F2", "parentFrameId": "F1"})),
                Event::new("Page.frameStartedLoading", json!({"frameId": "F2"})),
                request("1", "F2", "http://a/frame"),
            ],
        );

        assert_eq!(session.pages.len(), 1);
        assert_eq!(session.entries[0].page_index, 0);
    }

    #[test]
    fn test_frame_with_requests_does_not_start_a_page() {
        let mut session = Session::new(ConvertOptions::default());
        run(
            &mut session,
            &[
                Event::new("Page.frameStartedLoading", json!({"frameId": "F1"})),
                request("1", "F1", "http://a/"),
                Event::new("Page.frameStartedLoading", json!({"frameId": "F1"})),
                Event::new("Page.frameStartedLoading", json!({"frameId": "F9"})),
            ],
        );

        assert_eq!(session.pages.len(), 2);
        assert_eq!(session.current_page, Some(1));
    }

    #[test]
    fn test_unknown_frame_is_skipped() {
        let mut session = Session::new(ConvertOptions::default());
        run(
            &mut session,
            &[
                Event::new("Page.frameStartedLoading", json!({"frameId": "F1"})),
                request("1", "nowhere", "http://a/"),
            ],
        );
        assert!(session.entries.is_empty());
    }

    #[test]
    fn test_unsupported_scheme_is_tracked_until_terminal_event() {
        let mut session = Session::new(ConvertOptions::default());
        run(
            &mut session,
            &[
                Event::new("Page.frameStartedLoading", json!({"frameId": "F1"})),
                request("9", "F1", "ftp://host/file"),
            ],
        );
        assert!(session.ignored.contains("9"));
        assert!(session.pages[0].start().is_none());

        run(
            &mut session,
            &[Event::new(
                "Network.loadingFailed",
                json!({"requestId": "9", "errorText": "net::ERR_ABORTED"}),
            )],
        );
        assert!(session.ignored.is_empty());
    }

    #[test]
    fn test_retire_appends_markers_until_unique() {
        let mut session = Session::new(ConvertOptions::default());
        run(
            &mut session,
            &[
                Event::new("Page.frameStartedLoading", json!({"frameId": "F1"})),
                request("1", "F1", "http://a/"),
                request("1", "F1", "http://a/again"),
                request("1", "F1", "http://a/third"),
            ],
        );

        let ids: Vec<_> = session.entries.iter().map(|e| e.request_id.as_str()).collect();
        assert_eq!(ids, ["1r", "1rr", "1"]);
        assert_eq!(session.by_request_id.len(), 3);
    }

    #[test]
    fn test_malformed_event_reports_position() {
        let mut session = Session::new(ConvertOptions::default());
        let err = session
            .process(4, &Event::new("Network.loadingFinished", json!({"timestamp": 1})))
            .unwrap_err();

        match err {
            Error::Event { index, method, .. } => {
                assert_eq!(index, 4);
                assert_eq!(method, "Network.loadingFinished");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
