use crate::Result;
use crate::page::PageRecord;
use crate::protocol::{LoadingFinished, RequestWillBeSent, ResourceTiming, ResponsePayload};
use crate::timing::{iso_timestamp, phase_timings, receive_time, total_time};
use harvest_core::har::{Cache, CacheEntry, Content, Entry, Request, Response, Timings};
use harvest_core::parse::{
    get_header_value, is_http1x, parse_headers, parse_post_data, parse_request_cookies,
    parse_response_cookies, query_params, request_header_size, response_header_size,
};
use url::Url;

const NO_TIMINGS: &str = "No timings available from the browser";

/// Clock readings kept from the response timing sample for the
/// loading-finished step
#[derive(Debug, Clone, Copy)]
struct SentAt {
    /// Monotonic seconds
    request_time: f64,
    /// Milliseconds after `request_time`
    receive_headers_end: f64,
}

/// One request/response exchange under construction.
///
/// The record is complete once a response has been populated; only complete
/// records turn into HAR entries.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub request_id: String,
    pub frame_id: Option<String>,
    pub page_index: usize,
    page_ref: String,
    started_date_time: String,
    time: f64,
    request: Request,
    response: Option<Response>,
    cache: Cache,
    timings: Timings,
    server_ip_address: Option<String>,
    connection: Option<String>,
    initial_priority: Option<String>,
    priority: Option<String>,
    resource_type: Option<String>,
    was_pushed: Option<u8>,
    sent_at: Option<SentAt>,
}

impl EntryRecord {
    /// Start a record from a request-initiation event
    pub fn from_request(event: &RequestWillBeSent, page_index: usize, page_ref: &str) -> Result<Self> {
        let request = &event.request;

        let (url, query_string) = match Url::parse(&request.url) {
            Ok(mut parsed) => {
                parsed.set_fragment(None);
                let query = query_params(&parsed);
                (parsed.to_string(), query)
            }
            Err(e) => {
                tracing::debug!("Keeping unparseable URL {} as-is: {}", request.url, e);
                let bare = request.url.split('#').next().unwrap_or_default();
                (bare.to_string(), Vec::new())
            }
        };

        let content_type = get_header_value(&request.headers, "Content-Type");
        let post_data = parse_post_data(content_type.as_deref(), request.post_data.as_deref())?;
        let cookies = get_header_value(&request.headers, "Cookie")
            .map(|value| parse_request_cookies(&value))
            .unwrap_or_default();

        Ok(Self {
            request_id: event.request_id.clone(),
            frame_id: event.frame_id.clone(),
            page_index,
            page_ref: page_ref.to_string(),
            started_date_time: iso_timestamp(event.wall_time),
            time: 0.0,
            request: Request {
                method: request.method.clone(),
                url,
                http_version: String::new(),
                cookies,
                headers: parse_headers(&request.headers),
                query_string,
                post_data,
                headers_size: -1,
                body_size: request.post_data.as_ref().map_or(0, |body| body.len() as i64),
            },
            response: None,
            cache: Cache::default(),
            timings: Timings::unavailable(NO_TIMINGS),
            server_ip_address: None,
            connection: None,
            initial_priority: request.initial_priority.clone(),
            priority: request.initial_priority.clone(),
            resource_type: event.resource_type.as_ref().map(|t| t.to_lowercase()),
            was_pushed: None,
            sent_at: None,
        })
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }

    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }

    pub fn is_cache_served(&self) -> bool {
        self.cache.before_request.is_some()
    }

    pub fn mark_served_from_cache(&mut self) {
        self.cache.before_request = Some(CacheEntry::placeholder());
    }

    pub fn set_priority(&mut self, priority: &str) {
        self.priority = Some(priority.to_string());
    }

    /// Fill in the response block from a response payload.
    ///
    /// `is_primary` tells whether this is the request that started `page`.
    pub fn populate_response(&mut self, payload: &ResponsePayload, page: &PageRecord, is_primary: bool) {
        let protocol = payload.protocol.clone().unwrap_or_default();
        let text_protocol = is_http1x(&protocol);

        let mut response = Response {
            status: payload.status,
            status_text: payload.status_text.clone(),
            http_version: protocol.clone(),
            cookies: get_header_value(&payload.headers, "Set-Cookie")
                .map(|value| parse_response_cookies(&value))
                .unwrap_or_default(),
            headers: parse_headers(&payload.headers),
            content: Content {
                size: 0,
                compression: None,
                mime_type: payload.mime_type.clone(),
            },
            redirect_url: get_header_value(&payload.headers, "Location").unwrap_or_default(),
            headers_size: -1,
            body_size: -1,
            transfer_size: payload.encoded_data_length.map(|len| len as i64),
        };

        // header sizes are only meaningful for text-framed protocols
        self.request.http_version = protocol.clone();

        if payload.from_local_cache() {
            if text_protocol {
                response.headers_size = response_header_size(
                    &protocol,
                    response.status,
                    &response.status_text,
                    &response.headers,
                );
            }
            if !payload.was_pushed() {
                self.mark_served_from_cache();
            }
        } else {
            if let Some(sent) = &payload.request_headers {
                self.request.headers = parse_headers(sent);
                self.request.cookies = get_header_value(sent, "Cookie")
                    .map(|value| parse_request_cookies(&value))
                    .unwrap_or_default();
            }

            if text_protocol {
                response.headers_size = match &payload.headers_text {
                    Some(text) => text.len() as i64,
                    None => response_header_size(
                        &protocol,
                        response.status,
                        &response.status_text,
                        &response.headers,
                    ),
                };
                self.request.headers_size = match &payload.request_headers_text {
                    Some(text) => text.len() as i64,
                    None => request_header_size(&self.request),
                };
            }
        }

        self.connection = payload.connection_id.as_ref().map(|id| id.to_string());
        self.server_ip_address = payload
            .remote_ip_address
            .clone()
            .filter(|address| !address.is_empty());
        self.response = Some(response);

        match &payload.timing {
            Some(sample) => {
                self.apply_timing(sample);
                if payload.connection_reused && !is_primary && text_protocol {
                    self.realign_start(sample, page);
                }
            }
            None => {
                self.timings = Timings::unavailable(NO_TIMINGS);
                self.time = 0.0;
                self.sent_at = None;
            }
        }
    }

    fn apply_timing(&mut self, sample: &ResourceTiming) {
        self.timings = phase_timings(sample);
        self.time = total_time(&self.timings);
        self.was_pushed = (sample.push_start > 0.0).then_some(1);
        self.sent_at = Some(SentAt {
            request_time: sample.request_time,
            receive_headers_end: sample.receive_headers_end,
        });
    }

    /// A reused connection may have queued the request; place the start at
    /// the moment it was actually sent, measured from the page's own clocks.
    fn realign_start(&mut self, sample: &ResourceTiming, page: &PageRecord) {
        let Some(start) = page.start() else {
            return;
        };
        let sent = start.wall_time + (sample.request_time - start.timestamp);
        self.started_date_time = iso_timestamp(sent);
    }

    /// Account for a chunk of decoded body bytes
    pub fn add_received_data(&mut self, length: i64) {
        match self.response.as_mut() {
            Some(response) => response.content.size += length,
            None => tracing::debug!(
                "Data received for {} before its response, ignoring {} bytes",
                self.request_id,
                length
            ),
        }
    }

    /// Close the exchange: receive time, totals and body sizes
    pub fn finish(&mut self, event: &LoadingFinished) {
        let Some(response) = self.response.as_mut() else {
            tracing::debug!("Loading finished for {} without a response", self.request_id);
            return;
        };

        if let Some(sent) = self.sent_at {
            self.timings.receive =
                receive_time(event.timestamp, sent.request_time, sent.receive_headers_end);
            self.time = total_time(&self.timings);
        }

        let encoded = event.encoded_data_length as i64;
        if encoded > 0 {
            response.transfer_size = Some(encoded);
            response.body_size = encoded;

            let saved = response.content.size - encoded;
            if saved > 0 {
                response.content.compression = Some(saved);
            }
        }
    }

    /// The emitted entry, or `None` if no response ever arrived
    pub fn into_entry(self) -> Option<Entry> {
        let response = self.response?;
        Some(Entry {
            page_ref: Some(self.page_ref),
            started_date_time: self.started_date_time,
            time: self.time,
            request: self.request,
            response,
            cache: self.cache,
            timings: self.timings,
            server_ip_address: self.server_ip_address,
            connection: self.connection,
            request_id: self.request_id,
            initial_priority: self.initial_priority,
            priority: self.priority,
            resource_type: self.resource_type,
            was_pushed: self.was_pushed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_event(params: serde_json::Value) -> RequestWillBeSent {
        serde_json::from_value(params).unwrap()
    }

    fn response(params: serde_json::Value) -> ResponsePayload {
        serde_json::from_value(params).unwrap()
    }

    fn stamped_page() -> PageRecord {
        let mut page = PageRecord::new("page_1".to_string(), "F1".to_string());
        page.stamp(0, 100.0, 1_700_000_000.0, "http://a/");
        page
    }

    fn get_entry() -> EntryRecord {
        let event = request_event(json!({
            "requestId": "R1",
            "frameId": "F1",
            "timestamp": 100.0,
            "wallTime": 1_700_000_000.0,
            "type": "Document",
            "request": {
                "url": "http://a/path?x=1&y=two#frag",
                "method": "GET",
                "headers": {"Cookie": "sid=1; theme=dark"},
                "initialPriority": "VeryHigh"
            }
        }));
        EntryRecord::from_request(&event, 0, "page_1").unwrap()
    }

    #[test]
    fn test_request_block() {
        let entry = get_entry();
        assert_eq!(entry.url(), "http://a/path?x=1&y=two");
        assert_eq!(entry.request.query_string.len(), 2);
        assert_eq!(entry.request.query_string[1].value, "two");
        assert_eq!(entry.request.cookies.len(), 2);
        assert_eq!(entry.request.body_size, 0);
        assert_eq!(entry.priority.as_deref(), Some("VeryHigh"));
        assert_eq!(entry.resource_type.as_deref(), Some("document"));
        assert!(!entry.is_complete());
    }

    #[test]
    fn test_post_body_is_described() {
        let event = request_event(json!({
            "requestId": "R2",
            "request": {
                "url": "https://a/api",
                "method": "POST",
                "headers": {"content-type": "application/x-www-form-urlencoded"},
                "postData": "a=1&b=2"
            }
        }));
        let entry = EntryRecord::from_request(&event, 0, "page_1").unwrap();

        assert_eq!(entry.request.body_size, 7);
        let post = entry.request.post_data.unwrap();
        assert_eq!(post.params.unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_json_body_is_fatal() {
        let event = request_event(json!({
            "requestId": "R3",
            "request": {
                "url": "https://a/api",
                "method": "POST",
                "headers": {"Content-Type": "application/json"},
                "postData": "{not json"
            }
        }));
        assert!(EntryRecord::from_request(&event, 0, "page_1").is_err());
    }

    #[test]
    fn test_http1_header_sizes_from_text() {
        let mut entry = get_entry();
        let headers_text = "x".repeat(120);
        entry.populate_response(
            &response(json!({
                "status": 302,
                "statusText": "Found",
                "protocol": "HTTP/1.1",
                "mimeType": "text/html",
                "headers": {"Location": "http://a/next", "Set-Cookie": "a=1\nb=2"},
                "headersText": headers_text,
                "requestHeaders": {"Host": "a", "Cookie": "c=3"},
                "requestHeadersText": "GET / HTTP/1.1\r\n\r\n",
                "connectionId": 42,
                "remoteIPAddress": "10.0.0.1"
            })),
            &stamped_page(),
            true,
        );

        let entry = entry.into_entry().unwrap();
        assert_eq!(entry.response.headers_size, 120);
        assert_eq!(entry.request.headers_size, 18);
        assert_eq!(entry.request.http_version, "HTTP/1.1");
        assert_eq!(entry.response.redirect_url, "http://a/next");
        assert_eq!(entry.response.cookies.len(), 2);
        assert_eq!(entry.request.cookies[0].name, "c");
        assert_eq!(entry.request.headers[0].name, "Host");
        assert_eq!(entry.connection.as_deref(), Some("42"));
        assert_eq!(entry.server_ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(entry.timings.comment.as_deref(), Some(NO_TIMINGS));
        assert_eq!(entry.timings.blocked, -1.0);
        assert_eq!(entry.timings.send, -1.0);
        assert_eq!(entry.time, 0.0);
    }

    #[test]
    fn test_h2_header_sizes_left_unset() {
        let mut entry = get_entry();
        entry.populate_response(
            &response(json!({
                "status": 200,
                "protocol": "h2",
                "headers": {"content-type": "text/html"},
                "headersText": "HTTP/2 200\r\n\r\n"
            })),
            &stamped_page(),
            true,
        );

        let entry = entry.into_entry().unwrap();
        assert_eq!(entry.response.headers_size, -1);
        assert_eq!(entry.request.headers_size, -1);
    }

    #[test]
    fn test_disk_cache_response_is_marked() {
        let mut entry = get_entry();
        entry.populate_response(
            &response(json!({
                "status": 200,
                "protocol": "http/1.1",
                "statusText": "OK",
                "headers": {"a": "b"},
                "fromDiskCache": true
            })),
            &stamped_page(),
            true,
        );

        assert!(entry.is_cache_served());
        let entry = entry.into_entry().unwrap();
        assert_eq!(entry.response.headers_size, 25);
        assert_eq!(entry.cache.before_request, Some(CacheEntry::placeholder()));
    }

    #[test]
    fn test_pushed_cache_response_is_not_marked() {
        let mut entry = get_entry();
        entry.populate_response(
            &response(json!({
                "status": 200,
                "protocol": "h2",
                "fromDiskCache": true,
                "timing": {"requestTime": 100.0, "pushStart": 100.5, "sendStart": 1.0, "sendEnd": 1.0, "receiveHeadersEnd": 2.0}
            })),
            &stamped_page(),
            true,
        );

        assert!(!entry.is_cache_served());
        assert_eq!(entry.was_pushed, Some(1));
    }

    #[test]
    fn test_timing_then_finish() {
        let mut entry = get_entry();
        entry.populate_response(
            &response(json!({
                "status": 200,
                "protocol": "http/1.1",
                "timing": {
                    "requestTime": 100.0,
                    "dnsStart": -1, "dnsEnd": -1,
                    "connectStart": 5, "connectEnd": 10,
                    "sslStart": -1, "sslEnd": -1,
                    "sendStart": 10, "sendEnd": 11,
                    "receiveHeadersEnd": 61
                }
            })),
            &stamped_page(),
            true,
        );
        assert_eq!(entry.timings.blocked, 5.0);
        assert_eq!(entry.timings.connect, 5.0);
        assert_eq!(entry.timings.wait, 50.0);
        assert_eq!(entry.time, 61.0);

        entry.add_received_data(800);
        entry.add_received_data(200);
        entry.finish(&LoadingFinished {
            request_id: "R1".to_string(),
            timestamp: 100.1,
            encoded_data_length: 600.0,
        });

        let entry = entry.into_entry().unwrap();
        assert_eq!(entry.timings.receive, 39.0);
        assert_eq!(entry.time, 100.0);
        assert_eq!(entry.response.content.size, 1000);
        assert_eq!(entry.response.body_size, 600);
        assert_eq!(entry.response.transfer_size, Some(600));
        assert_eq!(entry.response.content.compression, Some(400));
    }

    #[test]
    fn test_reused_connection_realigns_start() {
        let mut entry = get_entry();
        entry.populate_response(
            &response(json!({
                "status": 200,
                "protocol": "http/1.1",
                "connectionReused": true,
                "timing": {"requestTime": 102.5, "sendStart": 0, "sendEnd": 0, "receiveHeadersEnd": 1}
            })),
            &stamped_page(),
            false,
        );
        assert_eq!(entry.started_date_time, "2023-11-14T22:13:22.500Z");
    }

    #[test]
    fn test_primary_request_keeps_its_start() {
        let mut entry = get_entry();
        entry.populate_response(
            &response(json!({
                "status": 200,
                "protocol": "http/1.1",
                "connectionReused": true,
                "timing": {"requestTime": 102.5, "sendStart": 0, "sendEnd": 0, "receiveHeadersEnd": 1}
            })),
            &stamped_page(),
            true,
        );
        assert_eq!(entry.started_date_time, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn test_incomplete_record_yields_nothing() {
        let mut entry = get_entry();
        entry.add_received_data(10);
        entry.finish(&LoadingFinished {
            request_id: "R1".to_string(),
            timestamp: 101.0,
            encoded_data_length: 10.0,
        });
        assert!(entry.into_entry().is_none());
    }
}
