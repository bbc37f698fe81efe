//! ID3v2.4 timed-metadata writer/parser, plus CMAF `emsg` boxing.

use crate::binary::{decode_synchsafe, encode_synchsafe, BinaryWriter};
use crate::error::{Error, Result};

const ID3_MAGIC: &[u8; 3] = b"ID3";
const ID3_VERSION_MAJOR: u8 = 0x04;
const ID3_VERSION_MINOR: u8 = 0x00;
const EMSG_SCHEME_ID_URI: &str = "https://aomedia.org/emsg/ID3";
const DEFAULT_EMSG_TIMESCALE: u32 = 90_000;

/// ID3 frame text encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Id3Encoding {
    Iso8859_1 = 0,
    Utf16Bom = 1,
    Utf16Be = 2,
    Utf8 = 3,
}

impl Id3Encoding {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

fn encode_text(text: &str, encoding: Id3Encoding) -> Vec<u8> {
    match encoding {
        Id3Encoding::Iso8859_1 => text.chars().map(|c| c as u8).collect(),
        Id3Encoding::Utf8 => text.as_bytes().to_vec(),
        Id3Encoding::Utf16Be => text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect(),
        Id3Encoding::Utf16Bom => {
            let mut out = vec![0xFF, 0xFE];
            out.extend(text.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
            out
        }
    }
}

fn null_terminator(encoding: Id3Encoding) -> &'static [u8] {
    match encoding {
        Id3Encoding::Iso8859_1 | Id3Encoding::Utf8 => &[0x00],
        Id3Encoding::Utf16Bom | Id3Encoding::Utf16Be => &[0x00, 0x00],
    }
}

/// One ID3 frame: a 4-character ASCII id, an encoding tag, and the
/// already-encoded payload that follows the encoding byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3Frame {
    pub id: [u8; 4],
    pub encoding: Id3Encoding,
    pub payload: Vec<u8>,
}

impl Id3Frame {
    /// Builds a frame with raw (already-encoded) payload bytes.
    pub fn new(id: &str, encoding: Id3Encoding, payload: Vec<u8>) -> Self {
        let mut id_bytes = [b' '; 4];
        for (slot, byte) in id_bytes.iter_mut().zip(id.bytes().chain(std::iter::repeat(b' '))) {
            *slot = byte;
        }
        Self { id: id_bytes, encoding, payload }
    }

    /// A `TXXX` user-defined text frame: `{description, terminator, value}`.
    pub fn txxx(description: &str, value: &str, encoding: Id3Encoding) -> Self {
        let mut payload = encode_text(description, encoding);
        payload.extend_from_slice(null_terminator(encoding));
        payload.extend(encode_text(value, encoding));
        Self::new("TXXX", encoding, payload)
    }

    /// A simple single-value text frame (e.g. `TIT2`, `TPE1`, `TALB`).
    pub fn text(id: &str, value: &str, encoding: Id3Encoding) -> Self {
        Self::new(id, encoding, encode_text(value, encoding))
    }

    fn serialize_into(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(&self.id);
        let frame_size = 1 + self.payload.len() as u32;
        writer.write_bytes(&encode_synchsafe(frame_size));
        writer.write_u16(0x0000); // flags
        writer.write_u8(self.encoding.as_u8());
        writer.write_bytes(&self.payload);
    }
}

/// Timed ID3 metadata: a presentation time plus an ordered list of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ID3TimedMetadata {
    pub presentation_time: f64,
    pub frames: Vec<Id3Frame>,
}

impl ID3TimedMetadata {
    pub fn new(presentation_time: f64) -> Self {
        Self { presentation_time, frames: Vec::new() }
    }

    pub fn push(&mut self, frame: Id3Frame) {
        self.frames.push(frame);
    }

    /// Serializes the ID3v2.4 tag: magic, version, flags, synchsafe size, frames.
    pub fn serialize(&self) -> Vec<u8> {
        let mut frames_writer = BinaryWriter::new();
        for frame in &self.frames {
            frame.serialize_into(&mut frames_writer);
        }
        let frames_bytes = frames_writer.into_bytes();

        let mut out = BinaryWriter::with_capacity(10 + frames_bytes.len());
        out.write_bytes(ID3_MAGIC);
        out.write_u8(ID3_VERSION_MAJOR);
        out.write_u8(ID3_VERSION_MINOR);
        out.write_u8(0x00); // flags
        out.write_bytes(&encode_synchsafe(frames_bytes.len() as u32));
        out.write_bytes(&frames_bytes);
        out.into_bytes()
    }

    /// Parses a serialized ID3v2.4 tag back into frames. `presentation_time`
    /// is not carried on the wire and defaults to `0.0`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 10 || &data[0..3] != ID3_MAGIC {
            tracing::warn!("rejected input missing the ID3 magic header");
            return Err(Error::metadata_parse_error("missing ID3 magic"));
        }
        if data[3] != ID3_VERSION_MAJOR {
            tracing::warn!(version = data[3], "rejected unsupported ID3 version");
            return Err(Error::metadata_parse_error("unsupported ID3 version"));
        }
        let tag_size = decode_synchsafe(data[6..10].try_into().unwrap()) as usize;
        let body_end = 10 + tag_size;
        if body_end > data.len() {
            return Err(Error::metadata_parse_error("ID3 tag size exceeds input"));
        }
        let mut cursor = &data[10..body_end];

        let mut frames = Vec::new();
        while cursor.len() >= 10 {
            let id: [u8; 4] = cursor[0..4].try_into().unwrap();
            let frame_size = decode_synchsafe(cursor[4..8].try_into().unwrap()) as usize;
            if frame_size == 0 {
                break;
            }
            // flags occupy cursor[8..10]
            let encoding_and_payload_start = 10;
            if encoding_and_payload_start + frame_size > cursor.len() + 0 {
                return Err(Error::metadata_parse_error("truncated ID3 frame"));
            }
            let encoding_byte = cursor[10];
            let encoding = match encoding_byte {
                0 => Id3Encoding::Iso8859_1,
                1 => Id3Encoding::Utf16Bom,
                2 => Id3Encoding::Utf16Be,
                3 => Id3Encoding::Utf8,
                other => return Err(Error::metadata_parse_error(format!("unknown ID3 text encoding 0x{other:02X}"))),
            };
            let payload_len = frame_size - 1;
            let payload = cursor[11..11 + payload_len].to_vec();
            frames.push(Id3Frame { id, encoding, payload });

            let consumed = 10 + frame_size;
            cursor = &cursor[consumed..];
        }

        Ok(Self { presentation_time: 0.0, frames })
    }

    /// Boxes the serialized ID3 tag as a version-1 CMAF `emsg` with
    /// `scheme_id_uri = "https://aomedia.org/emsg/ID3"`.
    pub fn serialize_as_emsg(&self, timescale: u32) -> Vec<u8> {
        let presentation_time = (self.presentation_time * timescale as f64).round() as u64;

        let mut payload = BinaryWriter::new();
        payload.write_u32(timescale);
        payload.write_u64(presentation_time);
        payload.write_u32(0); // event_duration
        payload.write_u32(0); // id
        payload.write_cstr(EMSG_SCHEME_ID_URI);
        payload.write_cstr(""); // value
        payload.write_bytes(&self.serialize());

        BinaryWriter::full_box(*b"emsg", 1, 0, &payload.into_bytes())
    }

    /// `serialize_as_emsg` with the default 90 kHz timescale.
    pub fn serialize_as_emsg_default(&self) -> Vec<u8> {
        self.serialize_as_emsg(DEFAULT_EMSG_TIMESCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_text_frames() {
        let mut metadata = ID3TimedMetadata::new(1.5);
        metadata.push(Id3Frame::text("TIT2", "hello", Id3Encoding::Utf8));
        metadata.push(Id3Frame::txxx("custom", "value", Id3Encoding::Iso8859_1));

        let bytes = metadata.serialize();
        let parsed = ID3TimedMetadata::parse(&bytes).unwrap();

        assert_eq!(parsed.frames.len(), 2);
        assert_eq!(parsed.frames[0].id, *b"TIT2");
        assert_eq!(parsed.frames[0].encoding, Id3Encoding::Utf8);
        assert_eq!(parsed.frames[0].payload, metadata.frames[0].payload);
        assert_eq!(parsed.frames[1].id, *b"TXXX");
        assert_eq!(parsed.frames[1].payload, metadata.frames[1].payload);
    }

    #[test]
    fn serialize_as_emsg_uses_default_timescale_and_scheme() {
        let mut metadata = ID3TimedMetadata::new(2.0);
        metadata.push(Id3Frame::text("TIT2", "x", Id3Encoding::Utf8));

        let emsg = metadata.serialize_as_emsg_default();
        assert_eq!(&emsg[4..8], b"emsg");
        assert_eq!(emsg[8], 1); // version
        let scheme_bytes = EMSG_SCHEME_ID_URI.as_bytes();
        assert!(emsg.windows(scheme_bytes.len()).any(|w| w == scheme_bytes));
    }

    #[test]
    fn parse_rejects_missing_magic() {
        assert!(ID3TimedMetadata::parse(b"not an id3 tag").is_err());
    }

    #[test]
    fn utf16_bom_frame_round_trips() {
        let mut metadata = ID3TimedMetadata::new(0.0);
        metadata.push(Id3Frame::text("TIT2", "hi", Id3Encoding::Utf16Bom));
        let bytes = metadata.serialize();
        let parsed = ID3TimedMetadata::parse(&bytes).unwrap();
        assert_eq!(parsed.frames[0].encoding, Id3Encoding::Utf16Bom);
        assert_eq!(parsed.frames[0].payload, metadata.frames[0].payload);
    }
}
