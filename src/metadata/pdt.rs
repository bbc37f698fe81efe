//! `#EXT-X-PROGRAM-DATE-TIME` synchronization against accumulated media time.

use chrono::{DateTime, Utc};

/// Controls when a `#EXT-X-PROGRAM-DATE-TIME` tag is actually emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPolicy {
    EverySegment,
    EveryNSegments(u64),
    OnDiscontinuity,
}

/// Tracks wall-clock time against accumulated media duration so each
/// segment can be stamped with an accurate `#EXT-X-PROGRAM-DATE-TIME`.
#[derive(Debug, Clone)]
pub struct ProgramDateTimeSync {
    stream_start_date: DateTime<Utc>,
    accumulated_media_time: f64,
    segment_count: u64,
    policy: InsertionPolicy,
}

impl ProgramDateTimeSync {
    pub fn new(stream_start_date: DateTime<Utc>, policy: InsertionPolicy) -> Self {
        Self { stream_start_date, accumulated_media_time: 0.0, segment_count: 0, policy }
    }

    pub fn stream_start_date(&self) -> DateTime<Utc> {
        self.stream_start_date
    }

    pub fn accumulated_media_time(&self) -> f64 {
        self.accumulated_media_time
    }

    pub fn segment_count(&self) -> u64 {
        self.segment_count
    }

    /// Advances accumulated media time by `segment_duration` and returns the
    /// program-date-time at the start of the segment that just elapsed.
    pub fn advance_and_get_date(&mut self, segment_duration: f64) -> DateTime<Utc> {
        let date = self.stream_start_date
            + chrono::Duration::milliseconds((self.accumulated_media_time * 1000.0).round() as i64);
        self.accumulated_media_time += segment_duration;
        self.segment_count += 1;
        date
    }

    /// Advances unconditionally, but only returns `Some(tag)` when the
    /// insertion policy fires for this segment.
    pub fn tag_for_segment(&mut self, segment_duration: f64, is_discontinuity: bool) -> Option<String> {
        let date = self.advance_and_get_date(segment_duration);
        let fires = match self.policy {
            InsertionPolicy::EverySegment => true,
            InsertionPolicy::EveryNSegments(n) => n > 0 && (self.segment_count - 1) % n == 0,
            InsertionPolicy::OnDiscontinuity => is_discontinuity || self.segment_count == 1,
        };
        if !fires {
            return None;
        }
        Some(format!("#EXT-X-PROGRAM-DATE-TIME:{}", format_date(date)))
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
