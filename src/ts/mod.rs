//! MPEG-TS segment muxing: PES packetization, program tables, and
//! 188-byte packet assembly.

pub mod adts;
pub mod annexb;
pub mod packet;
pub mod pes;
pub mod psi;
pub mod segment;
pub mod types;

pub use segment::{build_ts_segment, SegmentInput};
pub use types::{AacDecoderConfig, AdaptationFieldControl, SampleData, StreamType, TsCodecConfig};
