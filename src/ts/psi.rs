//! Program-table generation: PAT and PMT sections, CRC-32'd per MPEG-2.

use crate::binary::{crc32_mpeg2, BinaryWriter};
use crate::ts::types::StreamType;

/// Default PID plan used by [`crate::ts::segment`].
pub const PID_PAT: u16 = 0x0000;
pub const PID_PMT: u16 = 0x0100;
pub const PID_VIDEO: u16 = 0x0101;
pub const PID_AUDIO: u16 = 0x0102;

/// One elementary stream entry for a PMT.
#[derive(Debug, Clone, Copy)]
pub struct PmtStreamEntry {
    pub stream_type: StreamType,
    pub elementary_pid: u16,
}

/// Builds a complete PAT section (header + one program entry + CRC).
pub fn build_pat_section(transport_stream_id: u16, program_number: u16, pmt_pid: u16) -> Vec<u8> {
    // section_length covers everything after the length field up to and
    // including the CRC: 5 header bytes + 4 program-entry bytes + 4 CRC bytes.
    let section_length: u16 = 5 + 4 + 4;

    let mut section = BinaryWriter::with_capacity(3 + section_length as usize);
    section.write_u8(0x00); // table_id: PAT
    section.write_u16(0xB000 | section_length); // section_syntax_indicator=1, reserved=11, length
    section.write_u16(transport_stream_id);
    section.write_u8(0xC1); // reserved=11, version=00000, current_next_indicator=1
    section.write_u8(0x00); // section_number
    section.write_u8(0x00); // last_section_number
    section.write_u16(program_number);
    section.write_u16(0xE000 | pmt_pid); // reserved=111, PMT PID

    let mut bytes = section.into_bytes();
    let crc = crc32_mpeg2(&bytes);
    bytes.extend_from_slice(&crc.to_be_bytes());
    bytes
}

/// Builds a complete PMT section (header + stream entries + CRC).
pub fn build_pmt_section(program_number: u16, pcr_pid: u16, streams: &[PmtStreamEntry]) -> Vec<u8> {
    let streams_len: usize = streams.len() * 5;
    // section_length covers: 9 header bytes (after length field) + program_info_length
    // field's own streams + CRC(4), where 9 = program_number(2)+version/current(1)
    // +section_number(1)+last_section_number(1)+pcr_pid(2)+program_info_length(2).
    let section_length = (9 + streams_len + 4) as u16;

    let mut section = BinaryWriter::with_capacity(3 + section_length as usize);
    section.write_u8(0x02); // table_id: PMT
    section.write_u16(0xB000 | section_length);
    section.write_u16(program_number);
    section.write_u8(0xC1); // reserved + version 0 + current_next_indicator=1
    section.write_u8(0x00); // section_number
    section.write_u8(0x00); // last_section_number
    section.write_u16(0xE000 | pcr_pid); // reserved=111, PCR_PID
    section.write_u16(0xF000); // reserved=1111, program_info_length=0

    for stream in streams {
        section.write_u8(stream.stream_type.as_u8());
        section.write_u16(0xE000 | stream.elementary_pid); // reserved=111, elementary PID
        section.write_u16(0xF000); // reserved=1111, ES_info_length=0
    }

    let mut bytes = section.into_bytes();
    let crc = crc32_mpeg2(&bytes);
    bytes.extend_from_slice(&crc.to_be_bytes());
    bytes
}
