//! Shared data model for the MPEG-TS muxer: samples, codec configuration,
//! and the stream-type table. `StreamType` carries the full MPEG-2/ATSC
//! registry (grounded on the PMT stream-type table used by the `rust-srec`
//! `ts` crate) even though the muxer itself only ever emits the three
//! codecs the specification names — a PMT reader built on top of this type
//! shouldn't lose information about PIDs it can't mux.

/// One encoded video/audio sample handed to the muxer.
///
/// For video, `data` is 4-byte-length-prefixed NAL units; for audio it is
/// a raw AAC access unit. `pts`/`dts` are 90 kHz ticks in the 33-bit range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleData {
    /// Encoded payload: length-prefixed NALUs (video) or a raw AAC AU (audio).
    pub data: Vec<u8>,
    /// Presentation timestamp, 90 kHz ticks.
    pub pts: u64,
    /// Decoding timestamp, 90 kHz ticks; `None` means "equal to `pts`".
    pub dts: Option<u64>,
    /// Sample duration, 90 kHz ticks.
    pub duration: u32,
    /// Whether this sample is a random-access point.
    pub is_sync: bool,
}

impl SampleData {
    /// The sample's DTS, defaulting to its PTS when none was supplied.
    pub fn dts_or_pts(&self) -> u64 {
        self.dts.unwrap_or(self.pts)
    }
}

/// AAC decoder configuration, as extracted from an `AudioSpecificConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AacDecoderConfig {
    /// MPEG-4 Audio Object Type minus 1 (preserved verbatim, never remapped).
    pub profile_minus_one: u8,
    /// Index into the 16-entry ADTS sample-rate table.
    pub sample_rate_index: u8,
    /// 4-bit channel configuration.
    pub channel_config: u8,
}

/// Per-segment codec descriptor. Built once per segment and read-only
/// during muxing.
#[derive(Debug, Clone, Default)]
pub struct TsCodecConfig {
    /// Annex-B formatted SPS, when a video track is present.
    pub sps: Option<Vec<u8>>,
    /// Annex-B formatted PPS, when a video track is present.
    pub pps: Option<Vec<u8>>,
    /// AAC decoder config, when an audio track is present.
    pub aac_config: Option<AacDecoderConfig>,
    /// Video PMT stream type: `0x1B` (AVC) or `0x24` (HEVC).
    pub video_stream_type: Option<u8>,
    /// Audio PMT stream type: `0x0F` (AAC).
    pub audio_stream_type: Option<u8>,
}

impl TsCodecConfig {
    /// True when a video track is configured.
    pub fn has_video(&self) -> bool {
        self.video_stream_type.is_some()
    }

    /// True when an audio track is configured.
    pub fn has_audio(&self) -> bool {
        self.audio_stream_type.is_some()
    }
}

/// MPEG-2/ATSC PMT stream-type registry. The muxer only ever constructs
/// `Avc`, `Hevc`, and `AdtsAac`; the rest exist so a PMT built from this
/// type never has to discard unknown-but-valid stream types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StreamType {
    /// AVC video (ITU-T H.264 / ISO/IEC 14496-10).
    Avc,
    /// HEVC video (ITU-T H.265 / ISO/IEC 23008-2).
    Hevc,
    /// ADTS-framed AAC audio.
    AdtsAac,
    /// LATM-framed AAC audio.
    LatmAac,
    /// AC-3 audio.
    Ac3,
    /// E-AC-3 audio.
    EAc3,
    /// MPEG-2 video.
    Mpeg2Video,
    /// MPEG-1/2 audio.
    Mpeg2Audio,
    /// Any other registered value, kept verbatim.
    Other(u8),
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.as_u8())
    }
}

impl StreamType {
    /// Maps a stream type to its PMT `stream_type` byte.
    pub const fn as_u8(self) -> u8 {
        match self {
            StreamType::Mpeg2Video => 0x02,
            StreamType::Mpeg2Audio => 0x04,
            StreamType::AdtsAac => 0x0F,
            StreamType::LatmAac => 0x11,
            StreamType::Avc => 0x1B,
            StreamType::Hevc => 0x24,
            StreamType::Ac3 => 0x81,
            StreamType::EAc3 => 0x87,
            StreamType::Other(value) => value,
        }
    }

    /// Maps a PMT `stream_type` byte to a `StreamType`.
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x02 => StreamType::Mpeg2Video,
            0x04 => StreamType::Mpeg2Audio,
            0x0F => StreamType::AdtsAac,
            0x11 => StreamType::LatmAac,
            0x1B => StreamType::Avc,
            0x24 => StreamType::Hevc,
            0x81 => StreamType::Ac3,
            0x87 => StreamType::EAc3,
            other => StreamType::Other(other),
        }
    }

    /// Whether the muxer's segment builder supports emitting this type.
    pub const fn is_muxable(self) -> bool {
        matches!(self, StreamType::Avc | StreamType::Hevc | StreamType::AdtsAac)
    }

    /// Whether this is a video stream type.
    pub const fn is_video(self) -> bool {
        matches!(self, StreamType::Avc | StreamType::Hevc | StreamType::Mpeg2Video)
    }

    /// Whether this is an audio stream type.
    pub const fn is_audio(self) -> bool {
        matches!(
            self,
            StreamType::AdtsAac
                | StreamType::LatmAac
                | StreamType::Ac3
                | StreamType::EAc3
                | StreamType::Mpeg2Audio
        )
    }
}

/// Adaptation-field-control values from the TS packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptationFieldControl {
    /// Reserved value (`00`), never produced by this muxer.
    Reserved,
    /// Payload only, no adaptation field.
    PayloadOnly,
    /// Adaptation field only, no payload.
    AdaptationOnly,
    /// Adaptation field followed by payload.
    AdaptationAndPayload,
}

impl AdaptationFieldControl {
    /// The 2-bit encoding used in the TS packet header.
    pub const fn as_bits(self) -> u8 {
        match self {
            AdaptationFieldControl::Reserved => 0b00,
            AdaptationFieldControl::AdaptationOnly => 0b10,
            AdaptationFieldControl::PayloadOnly => 0b01,
            AdaptationFieldControl::AdaptationAndPayload => 0b11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_type_round_trips_known_values() {
        assert_eq!(StreamType::from_u8(0x1B), StreamType::Avc);
        assert_eq!(StreamType::from_u8(0x24), StreamType::Hevc);
        assert_eq!(StreamType::from_u8(0x0F), StreamType::AdtsAac);
        assert_eq!(StreamType::Avc.as_u8(), 0x1B);
        assert_eq!(StreamType::Hevc.as_u8(), 0x24);
        assert_eq!(StreamType::AdtsAac.as_u8(), 0x0F);
    }

    #[test]
    fn stream_type_unknown_is_preserved() {
        assert_eq!(StreamType::from_u8(0x06), StreamType::Other(0x06));
        assert_eq!(StreamType::Other(0x06).as_u8(), 0x06);
    }

    #[test]
    fn muxable_set_matches_the_specification() {
        assert!(StreamType::Avc.is_muxable());
        assert!(StreamType::Hevc.is_muxable());
        assert!(StreamType::AdtsAac.is_muxable());
        assert!(!StreamType::Ac3.is_muxable());
    }
}
