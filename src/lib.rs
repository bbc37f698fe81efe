//! A live HLS origin toolkit: MPEG-TS segment muxing, sliding/event/DVR
//! playlist management, and the timed-metadata subsystem (SCTE-35, ID3,
//! `EXT-X-DATERANGE`, interstitials, program-date-time) that rides along
//! with it.
//!
//! Binary codecs (TS muxing, PES, ADTS, ID3, SCTE-35, Annex-B, CRC) are
//! synchronous and allocation-light. The stateful, multi-writer pieces —
//! playlists, the date-range store, the interstitial manager — are
//! serialized behind `tokio::sync::Mutex` and publish lifecycle events over
//! `tokio::sync::broadcast`.

pub mod binary;
pub mod config;
pub mod error;
pub mod external;
pub mod failover;
pub mod metadata;
pub mod playlist;
pub mod ts;

pub use config::{MuxerConfig, MuxerConfigBuilder, PlaylistConfig, PlaylistConfigBuilder};
pub use error::{Error, Result};
pub use failover::FailoverManager;
