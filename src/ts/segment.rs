//! Segment builder: assembles a complete MPEG-TS segment (PAT, PMT, and
//! interleaved, packetized elementary streams) from a batch of samples.

use crate::config::MuxerConfig;
use crate::error::{Error, Result};
use crate::ts::annexb::to_annex_b;
use crate::ts::packet::{packetize, ContinuityCounters};
use crate::ts::pes::{build_pes_packet, STREAM_ID_AUDIO, STREAM_ID_VIDEO};
use crate::ts::psi::{build_pat_section, build_pmt_section, PmtStreamEntry, PID_AUDIO, PID_PAT, PID_PMT, PID_VIDEO};
use crate::ts::types::{SampleData, StreamType, TsCodecConfig};

/// 90 kHz-to-27 MHz PCR scale factor (`pcr = pts * 300`).
const PCR_SCALE: u64 = 300;

/// The full input to a single segment build: all samples for the segment's
/// duration plus the codec configuration they share.
#[derive(Debug, Clone, Default)]
pub struct SegmentInput {
    pub video_samples: Vec<SampleData>,
    pub audio_samples: Vec<SampleData>,
    pub codec_config: TsCodecConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Track {
    Video,
    Audio,
}

/// Builds a complete MPEG-TS segment: PAT packet, PMT packet, then every
/// sample interleaved in ascending PTS order and packetized under the
/// fixed PID plan (PAT=0x0000, PMT=0x0100, video=0x0101, audio=0x0102).
pub fn build_ts_segment(input: &SegmentInput, muxer_config: &MuxerConfig) -> Result<Vec<u8>> {
    let config = &input.codec_config;
    if !config.has_video() && !config.has_audio() {
        tracing::warn!("rejected segment build with neither video nor audio configured");
        return Err(Error::invalid_configuration("segment has neither video nor audio configured"));
    }
    tracing::debug!(
        video_samples = input.video_samples.len(),
        audio_samples = input.audio_samples.len(),
        "building TS segment"
    );

    let mut streams = Vec::new();
    if let Some(video_stream_type) = config.video_stream_type {
        streams.push(PmtStreamEntry {
            stream_type: StreamType::from_u8(video_stream_type),
            elementary_pid: PID_VIDEO,
        });
    }
    if let Some(audio_stream_type) = config.audio_stream_type {
        streams.push(PmtStreamEntry {
            stream_type: StreamType::from_u8(audio_stream_type),
            elementary_pid: PID_AUDIO,
        });
    }
    // PCR rides on the video PID whenever video is present; audio-only
    // segments carry it on the audio PID instead.
    let pcr_pid = if config.has_video() { PID_VIDEO } else { PID_AUDIO };

    let mut counters = ContinuityCounters::new();
    let mut out = Vec::new();

    out.extend_from_slice(&packetize(
        PID_PAT,
        &build_pat_section(muxer_config.transport_stream_id, muxer_config.program_number, PID_PMT),
        &mut counters,
        None,
        false,
    ));
    out.extend_from_slice(&packetize(
        PID_PMT,
        &build_pmt_section(muxer_config.program_number, pcr_pid, &streams),
        &mut counters,
        None,
        false,
    ));

    let mut ordered: Vec<(Track, &SampleData)> = Vec::with_capacity(input.video_samples.len() + input.audio_samples.len());
    ordered.extend(input.video_samples.iter().map(|s| (Track::Video, s)));
    ordered.extend(input.audio_samples.iter().map(|s| (Track::Audio, s)));
    ordered.sort_by_key(|(_, sample)| sample.pts);

    for (track, sample) in ordered {
        match track {
            Track::Video => {
                let sps = config.sps.as_deref();
                let pps = config.pps.as_deref();
                let annex_b = to_annex_b(&sample.data, sample.is_sync, sps, pps)?;
                let pes = build_pes_packet(STREAM_ID_VIDEO, sample.pts, sample.dts, &annex_b)?;
                let wants_pcr = pcr_pid == PID_VIDEO && (muxer_config.pcr_on_every_video_sample || sample.is_sync);
                let pcr = wants_pcr.then(|| sample.dts_or_pts() * PCR_SCALE);
                out.extend_from_slice(&packetize(PID_VIDEO, &pes, &mut counters, pcr, sample.is_sync));
            }
            Track::Audio => {
                let pes = build_pes_packet(STREAM_ID_AUDIO, sample.pts, sample.dts, &sample.data)?;
                let pcr = (pcr_pid == PID_AUDIO).then(|| sample.dts_or_pts() * PCR_SCALE);
                out.extend_from_slice(&packetize(PID_AUDIO, &pes, &mut counters, pcr, false));
            }
        }
    }

    Ok(out)
}
