//! SCTE-35 `splice_info_section` serialization and parsing.
//!
//! The CRC-32 field is written as the placeholder `0xFFFFFFFF` and never
//! computed or verified on parse; see the open question this carries.

use crate::binary::BinaryWriter;
use crate::error::{Error, Result};

/// 90 kHz ticks per second, used for PTS <-> seconds conversion.
pub const TICKS_PER_SECOND: u64 = 90_000;

/// Converts 90 kHz PTS ticks to seconds.
pub fn ticks_to_seconds(ticks: u64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

/// Converts seconds to 90 kHz PTS ticks.
pub fn seconds_to_ticks(seconds: f64) -> u64 {
    (seconds * TICKS_PER_SECOND as f64).round() as u64
}

/// `splice_command_type` values this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceCommandType {
    SpliceNull,
    SpliceInsert,
    TimeSignal,
}

impl SpliceCommandType {
    pub const fn as_u8(self) -> u8 {
        match self {
            SpliceCommandType::SpliceNull => 0x00,
            SpliceCommandType::SpliceInsert => 0x05,
            SpliceCommandType::TimeSignal => 0x06,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(SpliceCommandType::SpliceNull),
            0x05 => Some(SpliceCommandType::SpliceInsert),
            0x06 => Some(SpliceCommandType::TimeSignal),
            _ => None,
        }
    }
}

/// `segmentation_type_id` values from a `segmentation_descriptor`.
///
/// `descriptor_loop_length` is always zero in [`SCTE35Marker::serialize`] (this
/// crate doesn't build segmentation descriptors), but downstream callers that
/// parse a `segmentation_descriptor` out of a third-party marker's descriptor
/// loop need a typed way to interpret the `segmentation_type_id` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SegmentationType {
    NotIndicated,
    ContentIdentification,
    ProgramStart,
    ProgramEnd,
    ProgramEarlyTermination,
    ProgramBreakaway,
    ProgramResumption,
    ProgramRunoverPlanned,
    ProgramRunoverUnplanned,
    ProgramOverlapStart,
    ProgramBlackoutOverride,
    ProgramJoin,
    ChapterStart,
    ChapterEnd,
    BreakStart,
    BreakEnd,
    ProviderAdvertisementStart,
    ProviderAdvertisementEnd,
    DistributorAdvertisementStart,
    DistributorAdvertisementEnd,
    ProviderPlacementOpportunityStart,
    ProviderPlacementOpportunityEnd,
    DistributorPlacementOpportunityStart,
    DistributorPlacementOpportunityEnd,
    ProviderAdBlockStart,
    ProviderAdBlockEnd,
    DistributorAdBlockStart,
    DistributorAdBlockEnd,
    NetworkStart,
    NetworkEnd,
}

impl Default for SegmentationType {
    fn default() -> Self {
        SegmentationType::NotIndicated
    }
}

impl SegmentationType {
    /// Returns the wire `segmentation_type_id` for this variant.
    pub fn id(&self) -> u8 {
        use SegmentationType::*;
        match self {
            NotIndicated => 0x00,
            ContentIdentification => 0x01,
            ProgramStart => 0x10,
            ProgramEnd => 0x11,
            ProgramEarlyTermination => 0x12,
            ProgramBreakaway => 0x13,
            ProgramResumption => 0x14,
            ProgramRunoverPlanned => 0x15,
            ProgramRunoverUnplanned => 0x16,
            ProgramOverlapStart => 0x17,
            ProgramBlackoutOverride => 0x18,
            ProgramJoin => 0x19,
            ChapterStart => 0x20,
            ChapterEnd => 0x21,
            BreakStart => 0x22,
            BreakEnd => 0x23,
            ProviderAdvertisementStart => 0x30,
            ProviderAdvertisementEnd => 0x31,
            DistributorAdvertisementStart => 0x32,
            DistributorAdvertisementEnd => 0x33,
            ProviderPlacementOpportunityStart => 0x34,
            ProviderPlacementOpportunityEnd => 0x35,
            DistributorPlacementOpportunityStart => 0x36,
            DistributorPlacementOpportunityEnd => 0x37,
            ProviderAdBlockStart => 0x44,
            ProviderAdBlockEnd => 0x45,
            DistributorAdBlockStart => 0x46,
            DistributorAdBlockEnd => 0x47,
            NetworkStart => 0x50,
            NetworkEnd => 0x51,
        }
    }

    /// Maps a raw `segmentation_type_id` byte to its variant, falling back to
    /// `NotIndicated` for reserved or unrecognized values.
    pub fn from_id(id: u8) -> Self {
        use SegmentationType::*;
        match id {
            0x00 => NotIndicated,
            0x01 => ContentIdentification,
            0x10 => ProgramStart,
            0x11 => ProgramEnd,
            0x12 => ProgramEarlyTermination,
            0x13 => ProgramBreakaway,
            0x14 => ProgramResumption,
            0x15 => ProgramRunoverPlanned,
            0x16 => ProgramRunoverUnplanned,
            0x17 => ProgramOverlapStart,
            0x18 => ProgramBlackoutOverride,
            0x19 => ProgramJoin,
            0x20 => ChapterStart,
            0x21 => ChapterEnd,
            0x22 => BreakStart,
            0x23 => BreakEnd,
            0x30 => ProviderAdvertisementStart,
            0x31 => ProviderAdvertisementEnd,
            0x32 => DistributorAdvertisementStart,
            0x33 => DistributorAdvertisementEnd,
            0x34 => ProviderPlacementOpportunityStart,
            0x35 => ProviderPlacementOpportunityEnd,
            0x36 => DistributorPlacementOpportunityStart,
            0x37 => DistributorPlacementOpportunityEnd,
            0x44 => ProviderAdBlockStart,
            0x45 => ProviderAdBlockEnd,
            0x46 => DistributorAdBlockStart,
            0x47 => DistributorAdBlockEnd,
            0x50 => NetworkStart,
            0x51 => NetworkEnd,
            _ => NotIndicated,
        }
    }
}

/// `break_duration()`: an auto-return flag plus a 33-bit tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakDuration {
    pub auto_return: bool,
    pub duration_ticks: u64,
}

impl BreakDuration {
    pub fn seconds(&self) -> f64 {
        ticks_to_seconds(self.duration_ticks)
    }
}

/// An SCTE-35 `splice_info_section`.
#[derive(Debug, Clone, PartialEq)]
pub struct SCTE35Marker {
    pub command_type: SpliceCommandType,
    pub event_id: Option<u32>,
    pub out_of_network: bool,
    pub splice_time_ticks: Option<u64>,
    pub break_duration: Option<BreakDuration>,
    pub program_id: u16,
    pub avail_num: u8,
    pub avails_expected: u8,
}

impl Default for SCTE35Marker {
    fn default() -> Self {
        Self {
            command_type: SpliceCommandType::SpliceNull,
            event_id: None,
            out_of_network: false,
            splice_time_ticks: None,
            break_duration: None,
            program_id: 0,
            avail_num: 0,
            avails_expected: 0,
        }
    }
}

fn encode_splice_time_present(pts: u64) -> [u8; 5] {
    let high_bit = ((pts >> 32) & 0x01) as u8;
    let low32 = (pts & 0xFFFF_FFFF) as u32;
    let byte0 = 0x80 | 0x3E | high_bit;
    let rest = low32.to_be_bytes();
    [byte0, rest[0], rest[1], rest[2], rest[3]]
}

fn decode_splice_time_present(data: &[u8]) -> Result<u64> {
    if data.len() < 5 {
        return Err(Error::metadata_parse_error("truncated splice_time"));
    }
    let high_bit = (data[0] & 0x01) as u64;
    let low32 = u32::from_be_bytes(data[1..5].try_into().unwrap()) as u64;
    Ok((high_bit << 32) | low32)
}

fn encode_splice_time_optional(pts: Option<u64>) -> Vec<u8> {
    match pts {
        None => vec![0x7E],
        Some(pts) => encode_splice_time_present(pts).to_vec(),
    }
}

fn decode_splice_time_optional(data: &[u8]) -> Result<(Option<u64>, usize)> {
    if data.is_empty() {
        return Err(Error::metadata_parse_error("truncated splice_time"));
    }
    if data[0] == 0x7E {
        return Ok((None, 1));
    }
    Ok((Some(decode_splice_time_present(data)?), 5))
}

fn encode_break_duration(bd: &BreakDuration) -> [u8; 5] {
    let high_bit = ((bd.duration_ticks >> 32) & 0x01) as u8;
    let byte0 = (if bd.auto_return { 0x80 } else { 0x00 }) | 0x3E | high_bit;
    let rest = ((bd.duration_ticks & 0xFFFF_FFFF) as u32).to_be_bytes();
    [byte0, rest[0], rest[1], rest[2], rest[3]]
}

fn decode_break_duration(data: &[u8]) -> Result<BreakDuration> {
    if data.len() < 5 {
        return Err(Error::metadata_parse_error("truncated break_duration"));
    }
    let auto_return = data[0] & 0x80 != 0;
    let high_bit = (data[0] & 0x01) as u64;
    let low32 = u32::from_be_bytes(data[1..5].try_into().unwrap()) as u64;
    Ok(BreakDuration { auto_return, duration_ticks: (high_bit << 32) | low32 })
}

impl SCTE35Marker {
    fn encode_command_payload(&self) -> Result<Vec<u8>> {
        match self.command_type {
            SpliceCommandType::SpliceNull => Ok(Vec::new()),
            SpliceCommandType::TimeSignal => Ok(encode_splice_time_optional(self.splice_time_ticks)),
            SpliceCommandType::SpliceInsert => {
                let event_id = self
                    .event_id
                    .ok_or_else(|| Error::metadata_parse_error("splice_insert requires event_id"))?;

                let splice_immediate = self.splice_time_ticks.is_none();
                let duration_flag = self.break_duration.is_some();

                let mut flags = 0x0Fu8; // bits 3-0 reserved = 1111
                if self.out_of_network {
                    flags |= 0x80;
                }
                flags |= 0x40; // program_splice = 1
                if duration_flag {
                    flags |= 0x20;
                }
                if splice_immediate {
                    flags |= 0x10;
                }

                let mut writer = BinaryWriter::new();
                writer.write_u32(event_id);
                writer.write_u8(0x00); // splice_event_cancel_indicator
                writer.write_u8(flags);
                if let Some(ticks) = self.splice_time_ticks {
                    writer.write_bytes(&encode_splice_time_present(ticks));
                }
                if let Some(bd) = &self.break_duration {
                    writer.write_bytes(&encode_break_duration(bd));
                }
                writer.write_u16(self.program_id);
                writer.write_u8(self.avail_num);
                writer.write_u8(self.avails_expected);
                Ok(writer.into_bytes())
            }
        }
    }

    /// Serializes the marker into a raw `splice_info_section`.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let command_payload = self.encode_command_payload()?;
        if command_payload.len() > 0x0FFF {
            return Err(Error::metadata_parse_error("splice command payload too large"));
        }
        let splice_command_length = command_payload.len() as u16;

        let mut body = BinaryWriter::new();
        body.write_u8(0x00); // protocol_version
        body.write_u8(0x00); // encrypted_packet(1) + encryption_algorithm(6) + pts_adjustment high bit(1)
        body.write_u32(0x0000_0000); // pts_adjustment low 32 bits
        body.write_u8(0x00); // cw_index
        let tier: u16 = 0x0FFF;
        body.write_u8(((tier >> 4) & 0xFF) as u8);
        body.write_u8((((tier & 0x0F) << 4) as u8) | (((splice_command_length >> 8) & 0x0F) as u8));
        body.write_u8((splice_command_length & 0xFF) as u8);
        body.write_u8(self.command_type.as_u8());
        body.write_bytes(&command_payload);
        body.write_u16(0x0000); // descriptor_loop_length
        body.write_u32(0xFFFF_FFFF); // CRC32 placeholder, never computed

        let body_bytes = body.into_bytes();
        let section_length = body_bytes.len() as u16;

        let mut out = BinaryWriter::with_capacity(3 + body_bytes.len());
        out.write_u8(0xFC);
        out.write_u16(0x3000 | (section_length & 0x0FFF));
        out.write_bytes(&body_bytes);
        Ok(out.into_bytes())
    }

    /// Serializes, then hex-encodes with an uppercase `0x` prefix.
    pub fn serialize_hex(&self) -> Result<String> {
        Ok(format!("0x{}", hex::encode_upper(self.serialize()?)))
    }

    /// Parses a raw `splice_info_section`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 14 {
            tracing::warn!(len = data.len(), "splice_info_section shorter than the minimum fixed header");
            return Err(Error::metadata_parse_error("splice_info_section too short"));
        }
        if data[0] != 0xFC {
            tracing::warn!(table_id = data[0], "rejected splice_info_section with unexpected table_id");
            return Err(Error::metadata_parse_error("unexpected table_id"));
        }
        let protocol_version = data[3];
        if protocol_version != 0x00 {
            tracing::warn!(protocol_version, "rejected splice_info_section with unsupported protocol_version");
            return Err(Error::metadata_parse_error("unsupported protocol_version"));
        }

        let splice_command_length = (((data[11] & 0x0F) as u16) << 8) | data[12] as u16;
        let command_type_byte = data[13];
        let command_type = SpliceCommandType::from_u8(command_type_byte)
            .ok_or_else(|| Error::metadata_parse_error(format!("unknown splice command type 0x{command_type_byte:02X}")))?;

        let payload_start = 14;
        let payload_end = payload_start + splice_command_length as usize;
        if payload_end > data.len() {
            return Err(Error::metadata_parse_error("splice command payload exceeds section"));
        }
        let payload = &data[payload_start..payload_end];

        let mut marker = SCTE35Marker { command_type, ..Default::default() };

        match command_type {
            SpliceCommandType::SpliceNull => {}
            SpliceCommandType::TimeSignal => {
                let (splice_time, _) = decode_splice_time_optional(payload)?;
                marker.splice_time_ticks = splice_time;
            }
            SpliceCommandType::SpliceInsert => {
                if payload.len() < 6 {
                    return Err(Error::metadata_parse_error("truncated splice_insert"));
                }
                let event_id = u32::from_be_bytes(payload[0..4].try_into().unwrap());
                let flags = payload[5];
                let out_of_network = flags & 0x80 != 0;
                let duration_flag = flags & 0x20 != 0;
                let splice_immediate = flags & 0x10 != 0;

                let mut offset = 6;
                let splice_time_ticks = if splice_immediate {
                    None
                } else {
                    let ticks = decode_splice_time_present(&payload[offset..])?;
                    offset += 5;
                    Some(ticks)
                };

                let break_duration = if duration_flag {
                    let bd = decode_break_duration(&payload[offset..])?;
                    offset += 5;
                    Some(bd)
                } else {
                    None
                };

                if payload.len() < offset + 4 {
                    return Err(Error::metadata_parse_error("truncated splice_insert tail"));
                }
                let program_id = u16::from_be_bytes(payload[offset..offset + 2].try_into().unwrap());
                let avail_num = payload[offset + 2];
                let avails_expected = payload[offset + 3];

                marker.event_id = Some(event_id);
                marker.out_of_network = out_of_network;
                marker.splice_time_ticks = splice_time_ticks;
                marker.break_duration = break_duration;
                marker.program_id = program_id;
                marker.avail_num = avail_num;
                marker.avails_expected = avails_expected;
            }
        }

        Ok(marker)
    }

    /// Hex-decodes (with or without a `0x` prefix) then parses.
    pub fn parse_hex(input: &str) -> Result<Self> {
        let trimmed = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")).unwrap_or(input);
        let bytes = hex::decode(trimmed).map_err(|e| Error::metadata_parse_error(e.to_string()))?;
        Self::parse(&bytes)
    }
}
