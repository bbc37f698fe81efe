//! `DVRPlaylist`: time-based rewind window over a [`DVRBuffer`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;

use crate::config::PlaylistConfig;
use crate::error::{Error, Result};
use crate::metadata::daterange::DateRangeManager;
use crate::playlist::dvr_buffer::DVRBuffer;
use crate::playlist::events::PlaylistEvent;
use crate::playlist::render::{PlaylistMetadata, PlaylistRenderer, PlaylistType, RenderContext};
use crate::playlist::segment::LiveSegment;
use crate::playlist::sequence::MediaSequenceTracker;

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct State {
    buffer: DVRBuffer,
    tracker: MediaSequenceTracker,
    ended: bool,
}

/// DVR (rewindable) live playlist: retains segments within a trailing
/// `window_seconds` window of the live edge.
pub struct DVRPlaylist {
    config: PlaylistConfig,
    window_seconds: f64,
    state: Mutex<State>,
    events: broadcast::Sender<PlaylistEvent>,
    date_ranges: Option<Arc<DateRangeManager>>,
}

impl DVRPlaylist {
    pub fn new(config: PlaylistConfig, window_seconds: f64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            window_seconds,
            state: Mutex::new(State {
                buffer: DVRBuffer::new(),
                tracker: MediaSequenceTracker::new(),
                ended: false,
            }),
            events,
            date_ranges: None,
        }
    }

    /// Same as [`Self::new`], but every render pass merges the given date-range
    /// manager's open/closed ranges in as `#EXT-X-DATERANGE:` lines.
    pub fn with_date_ranges(config: PlaylistConfig, window_seconds: f64, date_ranges: Arc<DateRangeManager>) -> Self {
        Self { date_ranges: Some(date_ranges), ..Self::new(config, window_seconds) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaylistEvent> {
        self.events.subscribe()
    }

    /// Same subscription as [`Self::subscribe`], as a poll-friendly stream.
    pub fn subscribe_stream(&self) -> BroadcastStream<PlaylistEvent> {
        BroadcastStream::new(self.subscribe())
    }

    pub async fn add_segment(&self, segment: LiveSegment) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.ended {
            return Err(Error::StreamEnded);
        }

        state.tracker.record_add(&segment);
        tracing::debug!(index = segment.index, duration = segment.duration, "segment admitted");
        state.buffer.push(segment.clone());
        let _ = self.events.send(PlaylistEvent::SegmentAdded(segment));

        for evicted in state.buffer.evict_expired(self.window_seconds) {
            state.tracker.record_eviction(&evicted);
            let _ = self.events.send(PlaylistEvent::SegmentRemoved(evicted));
        }

        let _ = self.events.send(PlaylistEvent::PlaylistUpdated);
        Ok(())
    }

    pub async fn end_stream(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.ended {
            return Err(Error::StreamEnded);
        }
        state.ended = true;
        tracing::debug!("stream ended");
        let _ = self.events.send(PlaylistEvent::StreamEnded);
        Ok(())
    }

    pub async fn media_sequence(&self) -> u64 {
        self.state.lock().await.tracker.media_sequence()
    }

    pub async fn discontinuity_sequence(&self) -> u64 {
        self.state.lock().await.tracker.discontinuity_sequence()
    }

    pub async fn segment_count(&self) -> usize {
        self.state.lock().await.buffer.len()
    }

    /// Segments whose timestamp is `>= latest.timestamp + offset`, capped at `max_count`.
    pub async fn segments_from_offset(&self, offset: f64, max_count: usize) -> Vec<LiveSegment> {
        let state = self.state.lock().await;
        state.buffer.segments_from_offset(offset, max_count).into_iter().cloned().collect()
    }

    /// Segments whose `program_date_time` falls within `[from, to]`.
    pub async fn segments_in_date_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<LiveSegment> {
        let state = self.state.lock().await;
        state.buffer.segments_in_date_range(from, to).into_iter().cloned().collect()
    }

    pub async fn render(&self) -> String {
        let state = self.state.lock().await;
        let custom_tags = match &self.date_ranges {
            Some(date_ranges) => date_ranges.render_date_ranges().await,
            None => Vec::new(),
        };
        let metadata = PlaylistMetadata {
            custom_tags,
            independent_segments: self.config.independent_segments,
            ..Default::default()
        };
        let playlist_type = if self.config.is_event { PlaylistType::Event } else { PlaylistType::None };
        let ctx = RenderContext {
            segments: state.buffer.segments(),
            tracker: &state.tracker,
            metadata: &metadata,
            target_duration_fallback: self.config.target_duration,
            playlist_type,
            has_end_list: state.ended,
            version: self.config.version,
            init_segment_uri: None,
        };
        PlaylistRenderer::render(&ctx)
    }
}
