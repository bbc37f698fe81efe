//! Lifecycle events emitted by the live playlist managers.

use crate::playlist::segment::LiveSegment;

/// One lifecycle event, broadcast in the order
/// `segmentAdded -> segmentRemoved* -> playlistUpdated` within a single
/// `add_segment` call, and `streamEnded` once on `end_stream`.
#[derive(Debug, Clone)]
pub enum PlaylistEvent {
    SegmentAdded(LiveSegment),
    SegmentRemoved(LiveSegment),
    PlaylistUpdated,
    StreamEnded,
}
