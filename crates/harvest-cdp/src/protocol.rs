//! Typed parameters of the DevTools events the converter understands.
//!
//! Only the fields the converter reads are modelled. Everything that may be
//! missing from a recorded trace carries a default so that partial payloads
//! still decode.

use harvest_core::parse::RawHeaders;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStartedLoading {
    pub frame_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAttached {
    pub frame_id: String,
    pub parent_frame_id: String,
}

/// `Page.loadEventFired` / `Page.domContentEventFired`
#[derive(Debug, Clone, Deserialize)]
pub struct PageMilestone {
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSent {
    pub request_id: String,
    #[serde(default)]
    pub frame_id: Option<String>,
    pub request: RequestPayload,
    /// Monotonic seconds
    #[serde(default)]
    pub timestamp: f64,
    /// Wall-clock seconds since the epoch
    #[serde(default)]
    pub wall_time: f64,
    #[serde(default)]
    pub redirect_response: Option<ResponsePayload>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: RawHeaders,
    #[serde(default)]
    pub post_data: Option<String>,
    #[serde(default)]
    pub initial_priority: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceived {
    pub request_id: String,
    #[serde(default)]
    pub frame_id: Option<String>,
    pub response: ResponsePayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    #[serde(default)]
    pub url: String,
    pub status: i64,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: RawHeaders,
    #[serde(default)]
    pub headers_text: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    /// Headers actually put on the wire, when the browser reports them
    #[serde(default)]
    pub request_headers: Option<RawHeaders>,
    #[serde(default)]
    pub request_headers_text: Option<String>,
    #[serde(default)]
    pub connection_reused: bool,
    #[serde(default)]
    pub connection_id: Option<serde_json::Number>,
    #[serde(default, rename = "remoteIPAddress")]
    pub remote_ip_address: Option<String>,
    #[serde(default)]
    pub from_disk_cache: bool,
    #[serde(default)]
    pub from_prefetch_cache: bool,
    #[serde(default)]
    pub encoded_data_length: Option<f64>,
    #[serde(default)]
    pub timing: Option<ResourceTiming>,
    #[serde(default)]
    pub protocol: Option<String>,
}

impl ResponsePayload {
    /// Served without touching the network
    pub fn from_local_cache(&self) -> bool {
        self.from_disk_cache || self.from_prefetch_cache
    }

    /// Pushed by the server before the page asked for it
    pub fn was_pushed(&self) -> bool {
        self.timing.as_ref().is_some_and(|t| t.push_start > 0.0)
    }
}

/// Phase markers in milliseconds relative to `request_time` (seconds).
/// `-1` marks a phase that did not happen.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceTiming {
    pub request_time: f64,
    pub dns_start: f64,
    pub dns_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    pub ssl_start: f64,
    pub ssl_end: f64,
    pub send_start: f64,
    pub send_end: f64,
    pub push_start: f64,
    pub push_end: f64,
    pub receive_headers_end: f64,
}

impl Default for ResourceTiming {
    fn default() -> Self {
        Self {
            request_time: -1.0,
            dns_start: -1.0,
            dns_end: -1.0,
            connect_start: -1.0,
            connect_end: -1.0,
            ssl_start: -1.0,
            ssl_end: -1.0,
            send_start: -1.0,
            send_end: -1.0,
            push_start: 0.0,
            push_end: 0.0,
            receive_headers_end: -1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestServedFromCache {
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataReceived {
    pub request_id: String,
    #[serde(default)]
    pub data_length: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFinished {
    pub request_id: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub encoded_data_length: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailed {
    pub request_id: String,
    #[serde(default)]
    pub error_text: String,
    #[serde(default)]
    pub canceled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChangedPriority {
    pub request_id: String,
    pub new_priority: String,
}
