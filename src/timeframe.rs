//! Temporal bucketing for windowed stats

/// Aggregation window for token/pool stats.
///
/// Buckets are derived from event time (block timestamp), never from
/// ingestion time, so backfilled and live events land in the same bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Hour1,
    Day1,
    AllTime,
}

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Hour1 => "1h",
            Window::Day1 => "24h",
            Window::AllTime => "all-time",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(Window::Hour1),
            "24h" => Some(Window::Day1),
            "all-time" => Some(Window::AllTime),
            _ => None,
        }
    }

    pub fn all() -> [Window; 3] {
        [Window::Hour1, Window::Day1, Window::AllTime]
    }
}

/// Floor a Unix timestamp to the start of its bucket.
///
/// "1h" floors to the start of the UTC hour, "24h" to the start of the UTC
/// day, and "all-time" uses a single constant bucket. Buckets in the past
/// remain writable; out-of-order delivery is expected during backfill.
pub fn bucket_start(window: Window, timestamp: i64) -> i64 {
    match window {
        Window::Hour1 => timestamp - timestamp.rem_euclid(3600),
        Window::Day1 => timestamp - timestamp.rem_euclid(86400),
        Window::AllTime => 0,
    }
}
