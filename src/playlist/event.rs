//! `EventPlaylist`: never evicts; switches to `#EXT-X-ENDLIST` on `end_stream`.

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
    segments: Vec<LiveSegment>,
    tracker: MediaSequenceTracker,
    ended: bool,
}

/// Event playlist: retains every segment ever added and advertises
/// `#EXT-X-PLAYLIST-TYPE:EVENT`.
pub struct EventPlaylist {
    config: PlaylistConfig,
    state: Mutex<State>,
    events: broadcast::Sender<PlaylistEvent>,
    date_ranges: Option<Arc<DateRangeManager>>,
}

impl EventPlaylist {
    pub fn new(config: PlaylistConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            state: Mutex::new(State {
                segments: Vec::new(),
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
        state.segments.push(segment.clone());
        let _ = self.events.send(PlaylistEvent::SegmentAdded(segment));
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
            segments: &state.segments,
            tracker: &state.tracker,
            metadata: &metadata,
            target_duration_fallback: self.config.target_duration,
            playlist_type: PlaylistType::Event,
            has_end_list: state.ended,
            version: self.config.version,
            init_segment_uri: None,
        };
        PlaylistRenderer::render(&ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn segment(index: u64) -> LiveSegment {
        LiveSegment {
            index,
            data: Arc::from(Vec::new().into_boxed_slice()),
            duration: 6.0,
            timestamp_ticks: 0,
            timestamp_seconds: index as f64 * 6.0,
            is_independent: true,
            discontinuity: false,
            is_gap: false,
            program_date_time: None,
            filename: format!("s{index}.ts"),
            frame_count: 1,
            codecs: String::new(),
        }
    }

    #[tokio::test]
    async fn event_playlist_never_evicts() {
        let config = PlaylistConfig::builder().target_duration(6u64).build().unwrap();
        let playlist = EventPlaylist::new(config);
        for i in 0..10u64 {
            playlist.add_segment(segment(i)).await.unwrap();
        }
        assert_eq!(playlist.segment_count().await, 10);
        assert_eq!(playlist.media_sequence().await, 0);
    }

    #[tokio::test]
    async fn end_stream_renders_endlist_and_playlist_type() {
        let config = PlaylistConfig::builder().target_duration(6u64).build().unwrap();
        let playlist = EventPlaylist::new(config);
        playlist.add_segment(segment(0)).await.unwrap();
        playlist.end_stream().await.unwrap();
        let rendered = playlist.render().await;
        assert!(rendered.contains("#EXT-X-PLAYLIST-TYPE:EVENT"));
        assert!(rendered.contains("#EXT-X-ENDLIST"));
    }

    #[tokio::test]
    async fn render_merges_in_date_ranges_from_a_shared_manager() {
        use crate::metadata::daterange::DateRangeManager;

        let date_ranges = Arc::new(DateRangeManager::new());
        date_ranges
            .open(
                "ad-1",
                chrono::DateTime::parse_from_rfc3339("2026-07-26T00:00:00Z").unwrap().with_timezone(&chrono::Utc),
                None,
                None,
                Default::default(),
            )
            .await
            .unwrap();

        let config = PlaylistConfig::builder().target_duration(6u64).build().unwrap();
        let playlist = EventPlaylist::with_date_ranges(config, date_ranges);
        playlist.add_segment(segment(0)).await.unwrap();

        let rendered = playlist.render().await;
        assert!(rendered.contains("#EXT-X-DATERANGE:ID=\"ad-1\""));
    }
}
