//! Phase durations derived from browser timing samples.

use crate::protocol::ResourceTiming;
use chrono::{DateTime, SecondsFormat, Utc};
use harvest_core::har::Timings;

/// Round to whole microseconds, the precision the browser reports
pub fn format_millis(millis: f64) -> f64 {
    (millis * 1000.0).round() / 1000.0
}

/// Named phases of one timing sample. `receive` is left at zero; it is only
/// known once loading finishes.
pub fn phase_timings(sample: &ResourceTiming) -> Timings {
    let blocked = first_non_negative(&[sample.dns_start, sample.connect_start, sample.send_start])
        .map(format_millis)
        .unwrap_or(-1.0);

    Timings {
        blocked,
        dns: optional_phase(sample.dns_start, sample.dns_end),
        connect: optional_phase(sample.connect_start, sample.connect_end),
        send: duration(sample.send_start, sample.send_end),
        wait: duration(sample.send_end, sample.receive_headers_end),
        receive: 0.0,
        ssl: optional_phase(sample.ssl_start, sample.ssl_end),
        comment: None,
    }
}

/// Total elapsed time: phases that happened plus send, wait and receive
pub fn total_time(timings: &Timings) -> f64 {
    format_millis(
        timings.blocked.max(0.0)
            + timings.dns.max(0.0)
            + timings.connect.max(0.0)
            + timings.send
            + timings.wait
            + timings.receive,
    )
}

/// Time spent reading the body: from the request being sent (seconds) to
/// loading finishing (seconds), less the header phase (milliseconds)
pub fn receive_time(finished_at: f64, request_sent_at: f64, receive_headers_end: f64) -> f64 {
    duration(receive_headers_end, (finished_at - request_sent_at) * 1000.0)
}

/// Milliseconds between two monotonic timestamps given in seconds
pub fn elapsed_millis(since: f64, until: f64) -> f64 {
    format_millis((until - since) * 1000.0)
}

/// ISO-8601 rendering of wall-clock seconds since the epoch
pub fn iso_timestamp(epoch_seconds: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis((epoch_seconds * 1000.0).round() as i64)
        .map(|when| when.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn first_non_negative(values: &[f64]) -> Option<f64> {
    values.iter().copied().find(|v| *v >= 0.0)
}

fn optional_phase(start: f64, end: f64) -> f64 {
    if start >= 0.0 { duration(start, end) } else { -1.0 }
}

fn duration(start: f64, end: f64) -> f64 {
    format_millis((end - start).max(0.0))
}
