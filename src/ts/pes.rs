//! PES (Packetized Elementary Stream) packetization.

use crate::binary::BinaryWriter;
use crate::error::{Error, Result};

/// Video PES stream id.
pub const STREAM_ID_VIDEO: u8 = 0xE0;
/// Audio PES stream id.
pub const STREAM_ID_AUDIO: u8 = 0xC0;

const PTS_ONLY_MARKER: u8 = 0x2;
const PTS_IN_PTS_DTS_MARKER: u8 = 0x3;
const DTS_MARKER: u8 = 0x1;

/// Packs a 33-bit PTS/DTS value into 5 bytes with the given 4-bit marker,
/// per the pattern `{marker|bits[32:30]|1, bits[29:22], bits[21:15]|1,
/// bits[14:7], bits[6:0]|1}`.
fn encode_timestamp(marker: u8, value: u64) -> [u8; 5] {
    [
        (marker << 4) | (((value >> 29) & 0x0E) as u8) | 0x01,
        ((value >> 22) & 0xFF) as u8,
        (((value >> 14) & 0xFE) as u8) | 0x01,
        ((value >> 7) & 0xFF) as u8,
        (((value << 1) & 0xFE) as u8) | 0x01,
    ]
}

/// Builds a single PES packet (header + payload) for one sample.
///
/// `stream_id` selects video (`0xE0`) vs audio (`0xC0`) framing. The 2-byte
/// packet-length field is `0` for video payloads at or above 65519 bytes
/// (and for all video, per the specification's "always unbounded" rule for
/// video) and the actual length for audio.
pub fn build_pes_packet(stream_id: u8, pts: u64, dts: Option<u64>, payload: &[u8]) -> Result<Vec<u8>> {
    if pts >= 1 << 33 {
        return Err(Error::pes_error("PTS exceeds 33-bit range"));
    }
    if let Some(dts) = dts {
        if dts >= 1 << 33 {
            return Err(Error::pes_error("DTS exceeds 33-bit range"));
        }
    }

    let has_dts = matches!(dts, Some(d) if d != pts);

    let mut header_data = Vec::with_capacity(10);
    let flags_byte;
    if has_dts {
        flags_byte = 0xC0;
        header_data.extend_from_slice(&encode_timestamp(PTS_IN_PTS_DTS_MARKER, pts));
        header_data.extend_from_slice(&encode_timestamp(DTS_MARKER, dts.unwrap()));
    } else {
        flags_byte = 0x80;
        header_data.extend_from_slice(&encode_timestamp(PTS_ONLY_MARKER, pts));
    }

    let is_video = stream_id == STREAM_ID_VIDEO;
    let pes_packet_length = if is_video {
        0u16
    } else {
        let total = 3 + header_data.len() + payload.len(); // flags+marker+header_data_length + header_data + payload
        if total > u16::MAX as usize {
            return Err(Error::pes_error("audio PES packet exceeds 16-bit length"));
        }
        total as u16
    };

    let mut writer = BinaryWriter::with_capacity(9 + header_data.len() + payload.len());
    writer.write_u8(0x00);
    writer.write_u8(0x00);
    writer.write_u8(0x01);
    writer.write_u8(stream_id);
    writer.write_u16(pes_packet_length);
    writer.write_u8(0x80); // marker bits '10', no scrambling/priority/alignment/copyright/original flags set
    writer.write_u8(flags_byte);
    writer.write_u8(header_data.len() as u8);
    writer.write_bytes(&header_data);
    writer.write_bytes(payload);

    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pts_only_header_layout() {
        let packet = build_pes_packet(STREAM_ID_VIDEO, 0, None, &[0xAB]).unwrap();
        assert_eq!(&packet[0..4], &[0x00, 0x00, 0x01, STREAM_ID_VIDEO]);
        assert_eq!(&packet[4..6], &[0x00, 0x00]); // unbounded length for video
        assert_eq!(packet[6], 0x80);
        assert_eq!(packet[7], 0x80); // PTS-only flags
        assert_eq!(packet[8], 5); // header data length
        assert_eq!(packet[9] >> 4, PTS_ONLY_MARKER);
        assert_eq!(*packet.last().unwrap(), 0xAB);
    }

    #[test]
    fn pts_dts_header_layout() {
        let packet = build_pes_packet(STREAM_ID_VIDEO, 1000, Some(500), &[]).unwrap();
        assert_eq!(packet[7], 0xC0);
        assert_eq!(packet[8], 10);
        assert_eq!(packet[9] >> 4, PTS_IN_PTS_DTS_MARKER);
        assert_eq!(packet[14] >> 4, DTS_MARKER);
    }

    #[test]
    fn dts_equal_to_pts_uses_pts_only() {
        let packet = build_pes_packet(STREAM_ID_VIDEO, 1000, Some(1000), &[]).unwrap();
        assert_eq!(packet[7], 0x80);
        assert_eq!(packet[8], 5);
    }

    #[test]
    fn audio_packet_length_is_actual_length() {
        let payload = [0u8; 20];
        let packet = build_pes_packet(STREAM_ID_AUDIO, 0, None, &payload).unwrap();
        let declared_len = u16::from_be_bytes([packet[4], packet[5]]) as usize;
        // header (from flags byte onward) + payload
        assert_eq!(declared_len, 3 + 5 + payload.len());
    }

    #[test]
    fn timestamp_marker_bits_match_concrete_case() {
        // PTS = 0 encoded with PTS-only marker 0x2: byte0 = 0010_0001 = 0x21
        let encoded = encode_timestamp(PTS_ONLY_MARKER, 0);
        assert_eq!(encoded[0], 0x21);
        assert_eq!(encoded[1], 0x00);
        assert_eq!(encoded[2], 0x01);
        assert_eq!(encoded[3], 0x00);
        assert_eq!(encoded[4], 0x01);
    }
}
