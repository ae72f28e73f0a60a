//! Request timing instrumentation.
//!
//! [`Timings`] measures named phases of request handling and serializes them
//! into a `Server-Timing` response header. The catalog resolver uses it to
//! time the source read only, keeping I/O latency separate from in-memory
//! transform cost.

use std::time::{Duration, Instant};

/// Response header name carrying recorded spans.
pub const SERVER_TIMING_HEADER: &str = "Server-Timing";

/// Collected timing spans for one request.
#[derive(Debug, Default)]
pub struct Timings {
    spans: Vec<Span>,
}

#[derive(Debug)]
struct Span {
    label: String,
    duration: Duration,
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure `op`, record its duration under `label`, and return its
    /// result unchanged.
    pub fn time<T>(&mut self, label: impl Into<String>, op: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = op();
        self.spans.push(Span {
            label: label.into(),
            duration: start.elapsed(),
        });
        result
    }

    /// Render recorded spans as a `Server-Timing` header value, e.g.
    /// `"content-list;dur=12.34"`. Durations are in milliseconds.
    pub fn header_value(&self) -> String {
        self.spans
            .iter()
            .map(|span| {
                format!(
                    "{};dur={:.2}",
                    span.label,
                    span.duration.as_secs_f64() * 1000.0
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
