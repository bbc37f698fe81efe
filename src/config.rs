//! Builder-style configuration for playlists and the TS muxer.

use derive_builder::Builder;

/// Configuration for a live playlist (sliding-window, event, or DVR).
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(error = "crate::error::Error"))]
pub struct PlaylistConfig {
    /// Target segment duration advertised via `EXT-X-TARGETDURATION`, in seconds.
    pub target_duration: u64,
    /// Playlist compatibility version (`EXT-X-VERSION`).
    #[builder(default = "7")]
    pub version: u8,
    /// Number of segments retained in a sliding-window playlist.
    #[builder(default = "3")]
    pub window_size: usize,
    /// DVR retention window, in seconds. Ignored by sliding-window/event playlists.
    #[builder(default = "None")]
    pub dvr_window_seconds: Option<u64>,
    /// Whether the playlist advertises `EXT-X-PLAYLIST-TYPE:EVENT`.
    #[builder(default = "false")]
    pub is_event: bool,
    /// Whether to advertise independent segments (`EXT-X-INDEPENDENT-SEGMENTS`).
    #[builder(default = "true")]
    pub independent_segments: bool,
}

impl PlaylistConfig {
    pub fn builder() -> PlaylistConfigBuilder {
        PlaylistConfigBuilder::default()
    }
}

/// Configuration for the MPEG-TS segment muxer.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(error = "crate::error::Error"))]
pub struct MuxerConfig {
    /// Transport stream id advertised in the PAT.
    #[builder(default = "1")]
    pub transport_stream_id: u16,
    /// Program number advertised in the PAT/PMT.
    #[builder(default = "1")]
    pub program_number: u16,
    /// Whether to insert a PCR on every video sample (spec default) or only
    /// on keyframes.
    #[builder(default = "true")]
    pub pcr_on_every_video_sample: bool,
}

impl MuxerConfig {
    pub fn builder() -> MuxerConfigBuilder {
        MuxerConfigBuilder::default()
    }
}
