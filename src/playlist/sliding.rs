//! `SlidingWindowPlaylist`: fixed-size live window over the most recent segments.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;

use crate::config::PlaylistConfig;
use crate::error::{Error, Result};
use crate::metadata::daterange::DateRangeManager;
use crate::playlist::events::PlaylistEvent;
use crate::playlist::render::{PlaylistMetadata, PlaylistRenderer, PlaylistType, RenderContext};
use crate::playlist::segment::LiveSegment;
use crate::playlist::sequence::MediaSequenceTracker;

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct State {
    segments: VecDeque<LiveSegment>,
    tracker: MediaSequenceTracker,
    ended: bool,
}

/// Sliding-window live playlist: keeps at most `window_size` segments,
/// evicting from the front as new ones are added.
pub struct SlidingWindowPlaylist {
    config: PlaylistConfig,
    state: Mutex<State>,
    events: broadcast::Sender<PlaylistEvent>,
    date_ranges: Option<Arc<DateRangeManager>>,
}

impl SlidingWindowPlaylist {
    pub fn new(config: PlaylistConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            state: Mutex::new(State {
                segments: VecDeque::new(),
                tracker: MediaSequenceTracker::new(),
                ended: false,
            }),
            events,
            date_ranges: None,
        }
    }

    /// Same as [`Self::new`], but every render pass merges the given date-range
    /// manager's open/closed ranges in as `#EXT-X-DATERANGE:` lines.
    pub fn with_date_ranges(config: PlaylistConfig, date_ranges: Arc<DateRangeManager>) -> Self {
        Self { date_ranges: Some(date_ranges), ..Self::new(config) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaylistEvent> {
        self.events.subscribe()
    }

    /// Same subscription as [`Self::subscribe`], wrapped as a [`futures::Stream`]
    /// for callers that want to `.await` events with stream combinators
    /// instead of polling a raw [`broadcast::Receiver`].
    ///
    /// [`futures::Stream`]: https://docs.rs/futures/latest/futures/trait.Stream.html
    pub fn subscribe_stream(&self) -> BroadcastStream<PlaylistEvent> {
        BroadcastStream::new(self.subscribe())
    }

    /// Appends `segment`, then evicts from the front while the window is
    /// over capacity. Rejects the call once `end_stream` has been called.
    pub async fn add_segment(&self, segment: LiveSegment) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.ended {
            return Err(Error::StreamEnded);
        }

        state.tracker.record_add(&segment);
        tracing::debug!(index = segment.index, duration = segment.duration, "segment admitted");
        state.segments.push_back(segment.clone());
        let _ = self.events.send(PlaylistEvent::SegmentAdded(segment));

        while state.segments.len() > self.config.window_size {
            if let Some(evicted) = state.segments.pop_front() {
                state.tracker.record_eviction(&evicted);
                let _ = self.events.send(PlaylistEvent::SegmentRemoved(evicted));
            }
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
        self.state.lock().await.segments.len()
    }

    pub async fn render(&self) -> String {
        let state = self.state.lock().await;
        let segments: Vec<LiveSegment> = state.segments.iter().cloned().collect();
        let custom_tags = match &self.date_ranges {
            Some(date_ranges) => date_ranges.render_date_ranges().await,
            None => Vec::new(),
        };
        let metadata = PlaylistMetadata {
            custom_tags,
            independent_segments: self.config.independent_segments,
            ..Default::default()
        };
        let ctx = RenderContext {
            segments: &segments,
            tracker: &state.tracker,
            metadata: &metadata,
            target_duration_fallback: self.config.target_duration,
            playlist_type: PlaylistType::None,
            has_end_list: state.ended,
            version: self.config.version,
            init_segment_uri: None,
        };
        PlaylistRenderer::render(&ctx)
    }
}
