//! Timed metadata: SCTE-35 splice markers, ID3 tags, date ranges,
//! interstitials, program-date-time synchronization, and the injector that
//! coordinates all of it per segment.

pub mod daterange;
pub mod id3;
pub mod injector;
pub mod interstitial;
pub mod pdt;
pub mod scte35;

pub use daterange::{DateRangeManager, DateRangeState, ManagedDateRange};
pub use id3::{ID3TimedMetadata, Id3Encoding, Id3Frame};
pub use injector::{LiveMetadataInjector, SegmentMetadata};
pub use interstitial::{HLSInterstitial, InterstitialAsset, InterstitialManager, PreloadConfig, ResumeMode, Restrictions, SkipControl};
pub use pdt::{InsertionPolicy, ProgramDateTimeSync};
pub use scte35::{BreakDuration, SCTE35Marker, SpliceCommandType};
