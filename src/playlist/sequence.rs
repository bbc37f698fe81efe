//! `MediaSequenceTracker`: media-sequence / discontinuity-sequence bookkeeping.

use std::collections::HashSet;

use crate::playlist::segment::LiveSegment;

/// Tracks the media sequence, discontinuity sequence, and which resident
/// segment indices follow a discontinuity.
///
/// Invariants upheld by this type:
/// - `media_sequence` increases by exactly 1 per eviction.
/// - `discontinuity_sequence` increases by 1 only when an evicted segment's
///   index was marked as following a discontinuity.
/// - `discontinuity_indices` only ever contains indices still resident.
#[derive(Debug, Clone, Default)]
pub struct MediaSequenceTracker {
    media_sequence: u64,
    discontinuity_sequence: u64,
    total_added: u64,
    total_evicted: u64,
    discontinuity_indices: HashSet<u64>,
}

impl MediaSequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `segment` was appended to the playlist.
    pub fn record_add(&mut self, segment: &LiveSegment) {
        self.total_added += 1;
        if segment.discontinuity {
            self.discontinuity_indices.insert(segment.index);
        }
    }

    /// Records that `segment` was evicted from the front of the playlist.
    /// Advances `media_sequence` by 1 and `discontinuity_sequence` by 1 if
    /// the evicted segment had been marked as following a discontinuity.
    pub fn record_eviction(&mut self, segment: &LiveSegment) {
        self.total_evicted += 1;
        self.media_sequence += 1;
        tracing::debug!(index = segment.index, media_sequence = self.media_sequence, "segment evicted");
        if self.discontinuity_indices.remove(&segment.index) {
            self.discontinuity_sequence += 1;
            tracing::debug!(discontinuity_sequence = self.discontinuity_sequence, "discontinuity sequence advanced");
        }
    }

    /// Whether the resident segment at `index` follows a discontinuity.
    pub fn has_discontinuity(&self, index: u64) -> bool {
        self.discontinuity_indices.contains(&index)
    }

    pub fn media_sequence(&self) -> u64 {
        self.media_sequence
    }

    pub fn discontinuity_sequence(&self) -> u64 {
        self.discontinuity_sequence
    }

    pub fn total_added(&self) -> u64 {
        self.total_added
    }

    pub fn total_evicted(&self) -> u64 {
        self.total_evicted
    }
}
