//! `LiveSegment`: one completed media segment handed to a playlist manager.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// One completed media segment. Produced by an external segmenter;
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSegment {
    /// Globally monotonic index across the stream's lifetime. Never reused.
    pub index: u64,
    /// Opaque segment bytes (cheaply clonable for lifecycle-event broadcast).
    pub data: Arc<[u8]>,
    /// Segment duration, in seconds.
    pub duration: f64,
    /// Presentation time, in 90 kHz ticks.
    pub timestamp_ticks: u64,
    /// Presentation time, in seconds (`timestamp_ticks / 90_000`).
    pub timestamp_seconds: f64,
    /// Starts with a keyframe / random-access point.
    pub is_independent: bool,
    /// Follows a mux-level discontinuity.
    pub discontinuity: bool,
    /// Gap marker: no media present for this slot.
    pub is_gap: bool,
    /// Wall-clock program date-time, if known.
    pub program_date_time: Option<DateTime<Utc>>,
    /// Segment filename as referenced from the playlist.
    pub filename: String,
    /// Number of encoded frames contained in the segment.
    pub frame_count: u32,
    /// Codec string (e.g. `"avc1.64001f,mp4a.40.2"`).
    pub codecs: String,
}

impl LiveSegment {
    /// `90_000 * duration`, used when `timestamp_seconds` needs recomputing
    /// from a tick-only source.
    pub fn duration_ticks(&self) -> u64 {
        (self.duration * 90_000.0).round() as u64
    }
}
