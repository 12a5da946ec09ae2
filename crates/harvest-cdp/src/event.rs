use crate::protocol::{
    DataReceived, FrameAttached, FrameStartedLoading, LoadingFailed, LoadingFinished,
    PageMilestone, RequestServedFromCache, RequestWillBeSent, ResourceChangedPriority,
    ResponseReceived,
};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Methods that are recognised but carry nothing a HAR can hold
const IGNORED_METHODS: &[&str] = &[
    "Network.webSocketCreated",
    "Network.webSocketWillSendHandshakeRequest",
    "Network.webSocketHandshakeResponseReceived",
    "Network.webSocketFrameSent",
    "Network.webSocketFrameReceived",
    "Network.webSocketFrameError",
    "Network.webSocketClosed",
    "Network.eventSourceMessageReceived",
    "Network.requestWillBeSentExtraInfo",
    "Network.responseReceivedExtraInfo",
    "Network.requestIntercepted",
    "Network.signedExchangeReceived",
    "Page.frameNavigated",
    "Page.frameStoppedLoading",
    "Page.frameDetached",
    "Page.frameScheduledNavigation",
    "Page.frameClearedScheduledNavigation",
    "Page.frameRequestedNavigation",
    "Page.navigatedWithinDocument",
    "Page.frameResized",
    "Page.lifecycleEvent",
    "Page.javascriptDialogOpening",
    "Page.javascriptDialogClosed",
    "Page.screencastFrame",
    "Page.screencastVisibilityChanged",
    "Page.interstitialShown",
    "Page.interstitialHidden",
    "Page.windowOpen",
    "Page.documentOpened",
    "Page.backForwardCacheNotUsed",
];

/// One instrumentation record: a method name and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// An [`Event`] decoded into the payload its method implies
#[derive(Debug, Clone)]
pub enum CdpEvent {
    FrameStartedLoading(FrameStartedLoading),
    FrameAttached(FrameAttached),
    LoadEventFired(PageMilestone),
    DomContentEventFired(PageMilestone),
    RequestWillBeSent(Box<RequestWillBeSent>),
    RequestServedFromCache(RequestServedFromCache),
    ResponseReceived(Box<ResponseReceived>),
    DataReceived(DataReceived),
    LoadingFinished(LoadingFinished),
    LoadingFailed(LoadingFailed),
    ResourceChangedPriority(ResourceChangedPriority),
    /// Known method with nothing to record
    Ignored,
    /// Method this converter has never heard of
    Unknown,
}

impl Event {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Decode the parameters according to the method name
    pub fn decode(&self) -> Result<CdpEvent> {
        let event = match self.method.as_str() {
            "Page.frameStartedLoading" => CdpEvent::FrameStartedLoading(self.payload()?),
            "Page.frameAttached" => CdpEvent::FrameAttached(self.payload()?),
            "Page.loadEventFired" => CdpEvent::LoadEventFired(self.payload()?),
            "Page.domContentEventFired" => CdpEvent::DomContentEventFired(self.payload()?),
            "Network.requestWillBeSent" => CdpEvent::RequestWillBeSent(Box::new(self.payload()?)),
            "Network.requestServedFromCache" => {
                CdpEvent::RequestServedFromCache(self.payload()?)
            }
            "Network.responseReceived" => CdpEvent::ResponseReceived(Box::new(self.payload()?)),
            "Network.dataReceived" => CdpEvent::DataReceived(self.payload()?),
            "Network.loadingFinished" => CdpEvent::LoadingFinished(self.payload()?),
            "Network.loadingFailed" => CdpEvent::LoadingFailed(self.payload()?),
            "Network.resourceChangedPriority" => {
                CdpEvent::ResourceChangedPriority(self.payload()?)
            }
            method if IGNORED_METHODS.contains(&method) => CdpEvent::Ignored,
            _ => CdpEvent::Unknown,
        };
        Ok(event)
    }

    fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        let decoded = if self.params.is_null() {
            T::deserialize(&Value::Object(serde_json::Map::new()))
        } else {
            T::deserialize(&self.params)
        };
        decoded.map_err(|source| Error::MalformedPayload {
            method: self.method.clone(),
            source,
        })
    }
}

/// A recorded line: either a bare event or a ChromeDriver performance-log
/// record whose `message` wraps one, possibly as encoded JSON text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Record {
    Event(Event),
    Logged { message: Logged },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Logged {
    Encoded(String),
    Nested(Box<Record>),
}

impl Record {
    fn into_event(self) -> std::result::Result<Event, serde_json::Error> {
        match self {
            Record::Event(event) => Ok(event),
            Record::Logged {
                message: Logged::Nested(inner),
            } => inner.into_event(),
            Record::Logged {
                message: Logged::Encoded(text),
            } => serde_json::from_str::<Record>(&text)?.into_event(),
        }
    }
}

/// Read an event stream recorded as a JSON array or as newline-delimited
/// JSON, accepting bare events and performance-log records alike
pub fn read_events(text: &str) -> Result<Vec<Event>> {
    let text = text.trim_start_matches('\u{feff}').trim();

    if text.starts_with('[') {
        let records: Vec<Value> = serde_json::from_str(text)
            .map_err(|e| Error::Input(format!("not a JSON array of events: {}", e)))?;
        return records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| {
                serde_json::from_value::<Record>(record)
                    .and_then(Record::into_event)
                    .map_err(|e| Error::Input(format!("record {}: {}", idx + 1, e)))
            })
            .collect();
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<Record>(line)
                .and_then(Record::into_event)
                .map_err(|e| Error::Input(format!("line {}: {}", idx + 1, e)))
        })
        .collect()
}
