//! `DVRBuffer`: time-windowed segment storage with an index-to-position
//! side map rebuilt after every front-eviction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::playlist::segment::LiveSegment;

/// Ordered `LiveSegment` storage plus an `index -> position` side map.
#[derive(Debug, Default)]
pub struct DVRBuffer {
    segments: Vec<LiveSegment>,
    positions: HashMap<u64, usize>,
}

impl DVRBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: LiveSegment) {
        self.positions.insert(segment.index, self.segments.len());
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[LiveSegment] {
        &self.segments
    }

    pub fn latest(&self) -> Option<&LiveSegment> {
        self.segments.last()
    }

    pub fn get_by_index(&self, index: u64) -> Option<&LiveSegment> {
        self.positions.get(&index).map(|&pos| &self.segments[pos])
    }

    /// Removes every head segment whose `(timestamp + duration) < (latest.timestamp
    /// - window_seconds)`, rebuilds the side map, and returns the evicted segments
    /// in eviction order.
    pub fn evict_expired(&mut self, window_seconds: f64) -> Vec<LiveSegment> {
        let Some(latest) = self.latest() else {
            return Vec::new();
        };
        let cutoff = latest.timestamp_seconds - window_seconds;

        let mut split_at = 0;
        while split_at < self.segments.len() {
            let segment = &self.segments[split_at];
            if segment.timestamp_seconds + segment.duration < cutoff {
                split_at += 1;
            } else {
                break;
            }
        }

        let evicted: Vec<LiveSegment> = self.segments.drain(0..split_at).collect();
        self.rebuild_positions();
        evicted
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (pos, segment) in self.segments.iter().enumerate() {
            self.positions.insert(segment.index, pos);
        }
    }

    /// Segments whose timestamp is `>= latest.timestamp + offset` (negative
    /// offset rewinds from the live edge), capped at `max_count`.
    pub fn segments_from_offset(&self, offset: f64, max_count: usize) -> Vec<&LiveSegment> {
        let Some(latest) = self.latest() else {
            return Vec::new();
        };
        let threshold = latest.timestamp_seconds + offset;
        self.segments
            .iter()
            .filter(|s| s.timestamp_seconds >= threshold)
            .take(max_count)
            .collect()
    }

    /// Segments whose `program_date_time` falls within `[from, to]`.
    pub fn segments_in_date_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<&LiveSegment> {
        self.segments
            .iter()
            .filter(|s| matches!(s.program_date_time, Some(pdt) if pdt >= from && pdt <= to))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn segment(index: u64, timestamp_seconds: f64, duration: f64) -> LiveSegment {
        LiveSegment {
            index,
            data: Arc::from(Vec::new().into_boxed_slice()),
            duration,
            timestamp_ticks: (timestamp_seconds * 90_000.0) as u64,
            timestamp_seconds,
            is_independent: true,
            discontinuity: false,
            is_gap: false,
            program_date_time: None,
            filename: format!("s{index}.ts"),
            frame_count: 1,
            codecs: String::new(),
        }
    }

    #[test]
    fn evict_expired_with_window_60_keeps_everything() {
        let mut buffer = DVRBuffer::new();
        for (i, (ts, dur)) in [(0.0, 6.0), (6.0, 6.0), (12.0, 6.0), (18.0, 6.0), (56.0, 6.0), (62.0, 6.0)]
            .into_iter()
            .enumerate()
        {
            buffer.push(segment(i as u64, ts, dur));
        }
        let evicted = buffer.evict_expired(60.0);
        assert!(evicted.is_empty());
        assert_eq!(buffer.len(), 6);
    }

    #[test]
    fn evict_expired_with_window_50_drops_segments_ending_before_cutoff() {
        let mut buffer = DVRBuffer::new();
        for (i, (ts, dur)) in [(0.0, 6.0), (6.0, 6.0), (12.0, 6.0), (18.0, 6.0), (56.0, 6.0), (62.0, 6.0)]
            .into_iter()
            .enumerate()
        {
            buffer.push(segment(i as u64, ts, dur));
        }
        // cutoff = 62 - 50 = 12; evict segments with end <= 12 exclusive? end < 12
        let evicted = buffer.evict_expired(50.0);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].index, 0);
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn side_map_is_rebuilt_after_eviction() {
        let mut buffer = DVRBuffer::new();
        for i in 0..5u64 {
            buffer.push(segment(i, i as f64 * 6.0, 6.0));
        }
        buffer.evict_expired(0.0);
        assert!(buffer.get_by_index(0).is_none());
        assert!(buffer.get_by_index(4).is_some());
    }

    #[test]
    fn segments_from_offset_rewinds_from_the_live_edge() {
        let mut buffer = DVRBuffer::new();
        for i in 0..5u64 {
            buffer.push(segment(i, i as f64 * 6.0, 6.0));
        }
        let segments = buffer.segments_from_offset(-12.0, 10);
        assert_eq!(segments.len(), 3); // indices 2,3,4 at ts 12,18,24
    }
}
