//! Capability traits for services this crate orchestrates but does not
//! implement: transcoding, HTTP delivery, and thumbnail generation. The
//! core (muxer, playlists, metadata) never calls these; they exist so a
//! host application can plug a concrete implementation into the same
//! shape the rest of the crate expects.

use crate::error::Result;
use crate::ts::types::SampleData;

/// Encodes raw audio/video into the access units the muxer consumes.
pub trait Transcoder {
    /// Encodes one video frame into a length-prefixed NAL-unit access unit.
    fn encode_video(&mut self, raw_frame: &[u8], pts: u64) -> Result<SampleData>;

    /// Encodes one audio frame into a raw AAC access unit.
    fn encode_audio(&mut self, raw_frame: &[u8], pts: u64) -> Result<SampleData>;
}

/// A managed (remote/hosted) transcoding backend, as opposed to an
/// in-process [`Transcoder`].
pub trait ManagedTranscodingProvider {
    /// Submits a transcoding job and returns an opaque job id.
    fn submit_job(&self, source_uri: &str, profile: &str) -> Result<String>;

    /// Polls a previously submitted job for completion.
    fn poll_job(&self, job_id: &str) -> Result<TranscodingJobStatus>;
}

/// Status of a managed transcoding job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodingJobStatus {
    Queued,
    Running,
    Completed { output_uri: String },
    Failed { reason: String },
}

/// Minimal HTTP client surface needed to publish playlists/segments to an
/// origin or CDN.
pub trait HttpClient {
    /// Uploads `body` to `uri`, overwriting any existing object.
    fn put(&self, uri: &str, body: &[u8], content_type: &str) -> Result<()>;

    /// Fetches the current contents of `uri`, if it exists.
    fn get(&self, uri: &str) -> Result<Option<Vec<u8>>>;
}

/// Generates preview thumbnails, used by the interstitial/daterange
/// subsystem's optional `X-THUMBNAIL-URI` attributes.
pub trait ThumbnailImageProvider {
    /// Produces a thumbnail image for the frame nearest `pts`.
    fn thumbnail_at(&mut self, pts: u64) -> Result<Vec<u8>>;
}

/// A raw-audio encoder producing the access units [`crate::ts::types::
/// SampleData`] expects. `Cfg` is the encoder's own configuration type
/// (bitrate, sample rate, profile, ...); this crate never constructs one.
pub trait AudioEncoder<Cfg> {
    fn configure(&mut self, cfg: Cfg) -> Result<()>;
    fn encode(&mut self, buffer: &[u8]) -> Result<Vec<SampleData>>;
    fn flush(&mut self) -> Result<Vec<SampleData>>;
    fn teardown(&mut self) -> Result<()>;
}

/// A raw-video encoder producing the access units [`crate::ts::types::
/// SampleData`] expects.
pub trait VideoEncoder<Cfg> {
    fn configure(&mut self, cfg: Cfg) -> Result<()>;
    fn encode(&mut self, buffer: &[u8]) -> Result<Vec<SampleData>>;
    fn flush(&mut self) -> Result<Vec<SampleData>>;
    fn teardown(&mut self) -> Result<()>;
}
