use thiserror::Error as ThisError;

/// This crate's `Result` type.
pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy shared by every subsystem: playlist managers, the
/// metadata subsystem, and the TS muxer.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Error {
    /// A mutation was attempted on a playlist after `end_stream` was called.
    #[error("stream has already ended")]
    StreamEnded,

    /// A segment index was non-monotonic or otherwise invalid.
    #[error("invalid segment index: {0}")]
    InvalidSegmentIndex(String),

    /// A partial segment referenced a parent segment that isn't resident.
    #[error("parent segment not found: {0}")]
    ParentSegmentNotFound(u64),

    /// A configuration value was unusable (e.g. a zero-sized window).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed `avcC` / HEVC parameter sets.
    #[error("invalid AVC config: {0}")]
    InvalidAvcConfig(String),

    /// Malformed `esds` / ADTS decoder config.
    #[error("invalid audio config: {0}")]
    InvalidAudioConfig(String),

    /// A stream type outside of {AVC, HEVC, AAC}.
    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// A PES serialization invariant was broken.
    #[error("PES error: {0}")]
    PesError(String),

    /// A TS packet serialization invariant was broken.
    #[error("packet error: {0}")]
    PacketError(String),

    /// A date-range / interstitial id was referenced but is not known.
    #[error("unknown date range id: {0}")]
    UnknownDateRangeId(String),

    /// Malformed ID3 or SCTE-35 binary/hex input.
    #[error("metadata parse error: {0}")]
    MetadataParseError(String),

    /// Wraps a `ParseIntError` encountered while parsing a textual value.
    #[error("integer parse error: {0}")]
    ParseIntError(String),

    /// Wraps a `ParseFloatError` encountered while parsing a textual value.
    #[error("float parse error: {0}")]
    ParseFloatError(String),

    /// Wraps an I/O error surfaced by a capability the core delegates to.
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    pub(crate) fn invalid_segment_index<T: ToString>(value: T) -> Self {
        Self::InvalidSegmentIndex(value.to_string())
    }

    pub(crate) fn invalid_configuration<T: ToString>(value: T) -> Self {
        Self::InvalidConfiguration(value.to_string())
    }

    pub(crate) fn invalid_avc_config<T: ToString>(value: T) -> Self {
        Self::InvalidAvcConfig(value.to_string())
    }

    pub(crate) fn invalid_audio_config<T: ToString>(value: T) -> Self {
        Self::InvalidAudioConfig(value.to_string())
    }

    pub(crate) fn unsupported_codec<T: ToString>(value: T) -> Self {
        Self::UnsupportedCodec(value.to_string())
    }

    pub(crate) fn pes_error<T: ToString>(value: T) -> Self {
        Self::PesError(value.to_string())
    }

    pub(crate) fn packet_error<T: ToString>(value: T) -> Self {
        Self::PacketError(value.to_string())
    }

    pub(crate) fn metadata_parse_error<T: ToString>(value: T) -> Self {
        Self::MetadataParseError(value.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(value: std::num::ParseIntError) -> Self {
        Error::ParseIntError(value.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(value: std::num::ParseFloatError) -> Self {
        Error::ParseFloatError(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(value: derive_builder::UninitializedFieldError) -> Self {
        Error::InvalidConfiguration(value.to_string())
    }
}
