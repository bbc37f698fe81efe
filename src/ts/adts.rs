//! ADTS framing: wraps AAC access units for PES transport and parses an
//! ADTS byte stream back into access units.

use crate::error::{Error, Result};
use crate::ts::types::AacDecoderConfig;

/// 16-entry ADTS sampling-frequency table; indices 13-15 are reserved.
pub const SAMPLE_RATE_TABLE: [u32; 16] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350, 0, 0,
    0,
];

/// Looks up a sample rate from its ADTS index (`0` for reserved indices).
pub fn sample_rate_for_index(index: u8) -> u32 {
    SAMPLE_RATE_TABLE.get(index as usize).copied().unwrap_or(0)
}

const ADTS_HEADER_LEN: usize = 7;

/// Prepends a 7-byte ADTS header (no CRC) to a raw AAC access unit.
pub fn wrap(payload: &[u8], config: &AacDecoderConfig) -> Vec<u8> {
    let frame_length = (payload.len() + ADTS_HEADER_LEN) as u16;

    let mut out = Vec::with_capacity(payload.len() + ADTS_HEADER_LEN);
    out.push(0xFF); // sync word, high byte
    out.push(0xF1); // sync word low nibble=1111, MPEG-4=0, layer=00, protection_absent=1
    out.push(
        (config.profile_minus_one << 6)
            | (config.sample_rate_index << 2)
            | ((config.channel_config >> 2) & 0x01),
    );
    out.push(
        ((config.channel_config & 0x03) << 6)
            | ((frame_length >> 11) & 0x03) as u8,
    );
    out.push(((frame_length >> 3) & 0xFF) as u8);
    out.push((((frame_length & 0x07) as u8) << 5) | 0x1F); // frame_length low 3 bits | buffer fullness high 5 bits
    out.push(0xFC); // buffer fullness low 6 bits (all 1) | num_raw_data_blocks (00)
    out.extend_from_slice(payload);
    out
}

/// One frame reported by [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtsFrame<'a> {
    /// 2-bit MPEG-4 Audio Object Type minus one.
    pub profile: u8,
    /// Index into [`SAMPLE_RATE_TABLE`].
    pub sample_rate_index: u8,
    /// The resolved sample rate in Hz (`0` for reserved indices).
    pub sample_rate: u32,
    /// 4-bit channel configuration.
    pub channel_config: u8,
    /// The AAC payload (excludes the ADTS header).
    pub payload: &'a [u8],
    /// Header size in bytes: 7 (no CRC) or 9 (with CRC).
    pub header_size: usize,
    /// Total frame length, including the header.
    pub frame_length: usize,
}

/// Scans `data` for ADTS sync words and returns each complete frame found.
/// A partial trailing frame is neither consumed nor reported; the caller
/// should re-append it to the front of the next chunk.
pub fn parse(data: &[u8]) -> Result<Vec<AdtsFrame<'_>>> {
    let mut frames = Vec::new();
    let mut offset = 0;

    while offset + 7 <= data.len() {
        if data[offset] != 0xFF || (data[offset + 1] & 0xF0) != 0xF0 {
            tracing::warn!(offset, "ADTS sync word not found, rejecting stream");
            return Err(Error::invalid_audio_config("ADTS sync word not found"));
        }

        let protection_absent = data[offset + 1] & 0x01 != 0;
        let header_size = if protection_absent { 7 } else { 9 };

        let profile = (data[offset + 2] >> 6) & 0x03;
        let sample_rate_index = (data[offset + 2] >> 2) & 0x0F;
        let channel_config =
            ((data[offset + 2] & 0x01) << 2) | ((data[offset + 3] >> 6) & 0x03);
        let frame_length = (((data[offset + 3] as usize) & 0x03) << 11)
            | ((data[offset + 4] as usize) << 3)
            | ((data[offset + 5] as usize) >> 5);

        if offset + frame_length > data.len() {
            // partial trailing frame: stop without consuming it
            break;
        }
        if frame_length < header_size {
            return Err(Error::invalid_audio_config("ADTS frame_length shorter than header"));
        }

        frames.push(AdtsFrame {
            profile,
            sample_rate_index,
            sample_rate: sample_rate_for_index(sample_rate_index),
            channel_config,
            payload: &data[offset + header_size..offset + frame_length],
            header_size,
            frame_length,
        });

        offset += frame_length;
    }

    Ok(frames)
}

/// Walks an `esds` box's descriptor chain (tag `0x03` -> inner tag `0x04`
/// -> inner tag `0x05`) to recover the raw `AudioSpecificConfig` bytes.
pub fn extract_audio_specific_config(esds: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = esds;
    let es_descriptor = read_descriptor(&mut cursor, 0x03)?;

    let mut es_cursor = es_descriptor;
    // ES_ID (2 bytes) + flags (1 byte); skip stream dependence/URL/OCR fields
    // that are never present for the simple AAC case this muxer handles.
    if es_cursor.len() < 3 {
        return Err(Error::invalid_audio_config("truncated ES descriptor"));
    }
    es_cursor = &es_cursor[3..];

    let decoder_config = read_descriptor(&mut es_cursor, 0x04)?;
    // objectTypeIndication(1) + streamType/upStream/reserved(1) + bufferSizeDB(3)
    // + maxBitrate(4) + avgBitrate(4) = 13 bytes, then the nested 0x05 descriptor.
    if decoder_config.len() < 13 {
        return Err(Error::invalid_audio_config("truncated decoder config descriptor"));
    }
    let mut dc_cursor = &decoder_config[13..];
    let decoder_specific = read_descriptor(&mut dc_cursor, 0x05)?;

    Ok(decoder_specific.to_vec())
}

fn read_descriptor<'a>(cursor: &mut &'a [u8], expected_tag: u8) -> Result<&'a [u8]> {
    if cursor.is_empty() {
        return Err(Error::invalid_audio_config("truncated esds descriptor tag"));
    }
    let tag = cursor[0];
    if tag != expected_tag {
        return Err(Error::invalid_audio_config(format!(
            "esds tag mismatch: expected 0x{:02X}, found 0x{:02X}",
            expected_tag, tag
        )));
    }

    // MPEG-4 descriptor length is a variable-length big-endian value: each
    // byte's high bit signals continuation, up to 4 bytes.
    let mut offset = 1;
    let mut length: usize = 0;
    for _ in 0..4 {
        if offset >= cursor.len() {
            return Err(Error::invalid_audio_config("truncated esds length"));
        }
        let byte = cursor[offset];
        offset += 1;
        length = (length << 7) | (byte & 0x7F) as usize;
        if byte & 0x80 == 0 {
            break;
        }
    }

    if offset + length > cursor.len() {
        return Err(Error::invalid_audio_config("esds descriptor length exceeds remaining data"));
    }

    let payload = &cursor[offset..offset + length];
    *cursor = &cursor[offset + length..];
    Ok(payload)
}

/// Parses a raw `AudioSpecificConfig` into an [`AacDecoderConfig`],
/// preserving `profile = objectType - 1` verbatim (it is never remapped).
pub fn parse_audio_specific_config(asc: &[u8]) -> Result<AacDecoderConfig> {
    if asc.len() < 2 {
        return Err(Error::invalid_audio_config("AudioSpecificConfig too short"));
    }
    let object_type = (asc[0] >> 3) & 0x1F;
    if object_type == 0 {
        return Err(Error::invalid_audio_config("AudioSpecificConfig object type 0"));
    }
    let sample_rate_index = ((asc[0] & 0x07) << 1) | (asc[1] >> 7);
    let channel_config = (asc[1] >> 3) & 0x0F;

    Ok(AacDecoderConfig {
        profile_minus_one: object_type - 1,
        sample_rate_index,
        channel_config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wrap_matches_concrete_header_bytes() {
        let config = AacDecoderConfig {
            profile_minus_one: 1,
            sample_rate_index: 4,
            channel_config: 2,
        };
        let payload = [0u8; 10];
        let framed = wrap(&payload, &config);
        assert_eq!(&framed[0..3], &[0xFF, 0xF1, 0x50]);
        assert_eq!(framed.len(), 7 + payload.len());
    }

    #[test]
    fn wrap_then_parse_round_trips() {
        let config = AacDecoderConfig {
            profile_minus_one: 1,
            sample_rate_index: 4,
            channel_config: 2,
        };
        let payload = [0xAA, 0xBB, 0xCC, 0xDD];
        let framed = wrap(&payload, &config);

        let frames = parse(&framed).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, &payload);
        assert_eq!(frames[0].header_size, 7);
        assert_eq!(frames[0].profile, 1);
        assert_eq!(frames[0].sample_rate_index, 4);
        assert_eq!(frames[0].sample_rate, 44100);
        assert_eq!(frames[0].channel_config, 2);
    }

    #[test]
    fn parse_handles_multiple_concatenated_frames() {
        let config = AacDecoderConfig {
            profile_minus_one: 1,
            sample_rate_index: 4,
            channel_config: 2,
        };
        let mut stream = wrap(&[1, 2, 3], &config);
        stream.extend_from_slice(&wrap(&[4, 5], &config));

        let frames = parse(&stream).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload, &[1, 2, 3]);
        assert_eq!(frames[1].payload, &[4, 5]);
    }

    #[test]
    fn parse_does_not_consume_partial_trailing_frame() {
        let config = AacDecoderConfig {
            profile_minus_one: 1,
            sample_rate_index: 4,
            channel_config: 2,
        };
        let mut stream = wrap(&[1, 2, 3], &config);
        stream.extend_from_slice(&[0xFF, 0xF1, 0x00]); // partial next frame header

        let frames = parse(&stream).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, &[1, 2, 3]);
    }

    #[test]
    fn reserved_sample_rate_indices_are_zero() {
        assert_eq!(sample_rate_for_index(13), 0);
        assert_eq!(sample_rate_for_index(14), 0);
        assert_eq!(sample_rate_for_index(15), 0);
        assert_eq!(sample_rate_for_index(4), 44100);
    }

    #[test]
    fn extract_audio_specific_config_walks_the_descriptor_chain() {
        let asc = [0x12, 0x10]; // AAC-LC, 44100, stereo
        let mut decoder_specific = vec![0x05, asc.len() as u8];
        decoder_specific.extend_from_slice(&asc);

        let mut decoder_config = vec![0x04, (13 + decoder_specific.len()) as u8];
        decoder_config.extend_from_slice(&[0x40, 0x15, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        decoder_config.extend_from_slice(&decoder_specific);

        let mut es_descriptor = vec![0x03, (3 + decoder_config.len()) as u8];
        es_descriptor.extend_from_slice(&[0, 0, 0]);
        es_descriptor.extend_from_slice(&decoder_config);

        let extracted = extract_audio_specific_config(&es_descriptor).unwrap();
        assert_eq!(extracted, asc);
    }

    #[test]
    fn extract_audio_specific_config_fails_on_tag_mismatch() {
        let bad = [0x04, 0x00];
        assert!(extract_audio_specific_config(&bad).is_err());
    }

    #[test]
    fn parse_audio_specific_config_preserves_profile_minus_one() {
        // objectType=2 (AAC-LC) -> profile_minus_one=1
        let asc = [0x12, 0x10];
        let config = parse_audio_specific_config(&asc).unwrap();
        assert_eq!(config.profile_minus_one, 1);
        assert_eq!(config.sample_rate_index, 4);
        assert_eq!(config.channel_config, 2);
    }
}
