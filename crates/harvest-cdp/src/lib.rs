//! Turns an ordered stream of DevTools `Page.*` and `Network.*` events into
//! a HAR document.
//!
//! ```no_run
//! use harvest_cdp::{ConvertOptions, har_from_events, read_events};
//!
//! let text = std::fs::read_to_string("events.json")?;
//! let events = read_events(&text)?;
//! let har = har_from_events(&events, &ConvertOptions::default())?;
//! println!("{} entries", har.log.entries.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod entry;
mod error;
mod event;
mod finalize;
mod frames;
mod options;
mod page;
pub mod protocol;
mod session;
pub mod timing;

pub use error::{Error, Result};
pub use event::{CdpEvent, Event, read_events};
pub use finalize::creator;
pub use frames::FrameTree;
pub use options::ConvertOptions;
pub use session::Session;

use harvest_core::har::Har;

/// Fold a whole event stream into a HAR document.
///
/// Stops at the first event that cannot be processed; no partial document
/// is returned in that case.
pub fn har_from_events<'a, I>(events: I, options: &ConvertOptions) -> Result<Har>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut session = Session::new(options.clone());
    for (index, event) in events.into_iter().enumerate() {
        session.process(index, event)?;
    }
    Ok(session.finish())
}
