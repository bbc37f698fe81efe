//! Coordinates per-segment metadata: PDT tags, date ranges, interstitials,
//! and a queue of pending ID3 frames.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::metadata::daterange::DateRangeManager;
use crate::metadata::id3::{ID3TimedMetadata, Id3Encoding, Id3Frame};
use crate::metadata::interstitial::{HLSInterstitial, InterstitialManager};
use crate::metadata::pdt::{InsertionPolicy, ProgramDateTimeSync};

/// The metadata attached to a single emitted segment.
#[derive(Debug, Clone)]
pub struct SegmentMetadata {
    pub program_date_time: Option<String>,
    pub date_ranges: Vec<String>,
    pub interstitials: Vec<HLSInterstitial>,
    pub id3_data: Option<Vec<u8>>,
}

/// Coordinates the metadata subsystem for a single live stream.
pub struct LiveMetadataInjector {
    pdt: Mutex<ProgramDateTimeSync>,
    date_ranges: Arc<DateRangeManager>,
    interstitials: Arc<InterstitialManager>,
    pending_id3: Mutex<ID3TimedMetadata>,
}

impl LiveMetadataInjector {
    pub fn new(stream_start_date: DateTime<Utc>, policy: InsertionPolicy) -> Self {
        let date_ranges = Arc::new(DateRangeManager::new());
        let interstitials = Arc::new(InterstitialManager::new(Some(date_ranges.clone())));
        Self {
            pdt: Mutex::new(ProgramDateTimeSync::new(stream_start_date, policy)),
            date_ranges,
            interstitials,
            pending_id3: Mutex::new(ID3TimedMetadata::new(0.0)),
        }
    }

    pub fn date_ranges(&self) -> &Arc<DateRangeManager> {
        &self.date_ranges
    }

    pub fn interstitials(&self) -> &Arc<InterstitialManager> {
        &self.interstitials
    }

    /// Queues a `TIT2`/`TPE1`/`TALB` frame set for the next call to
    /// [`Self::metadata_for_segment`].
    pub async fn queue_track_info(&self, title: Option<&str>, artist: Option<&str>, album: Option<&str>) {
        let mut pending = self.pending_id3.lock().await;
        if let Some(title) = title {
            pending.push(Id3Frame::text("TIT2", title, Id3Encoding::Utf8));
        }
        if let Some(artist) = artist {
            pending.push(Id3Frame::text("TPE1", artist, Id3Encoding::Utf8));
        }
        if let Some(album) = album {
            pending.push(Id3Frame::text("TALB", album, Id3Encoding::Utf8));
        }
    }

    /// Queues an arbitrary ID3 frame for the next call to
    /// [`Self::metadata_for_segment`].
    pub async fn queue_frame(&self, frame: Id3Frame) {
        self.pending_id3.lock().await.push(frame);
    }

    /// Computes the metadata for the segment at `index` with `duration`
    /// seconds, advancing the PDT clock and draining the ID3 queue.
    pub async fn metadata_for_segment(&self, index: u64, duration: f64, is_discontinuity: bool) -> SegmentMetadata {
        let program_date_time = {
            let mut pdt = self.pdt.lock().await;
            pdt.tag_for_segment(duration, is_discontinuity)
        };

        let date_ranges = self.date_ranges.render_date_ranges().await;
        let now = Utc::now();
        let interstitials = self.interstitials.active_interstitials(now).await;

        let id3_data = {
            let mut pending = self.pending_id3.lock().await;
            if pending.frames.is_empty() {
                None
            } else {
                pending.presentation_time = index as f64 * duration;
                let bytes = pending.serialize();
                *pending = ID3TimedMetadata::new(0.0);
                Some(bytes)
            }
        };

        SegmentMetadata { program_date_time, date_ranges, interstitials, id3_data }
    }
}
