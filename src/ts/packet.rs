//! 188-byte TS packet assembly: continuity counters, adaptation field, PCR.

use std::collections::HashMap;

const PACKET_SIZE: usize = 188;
const SYNC_BYTE: u8 = 0x47;

/// Encodes a PCR value (27 MHz ticks) into the 6-byte `program_clock_reference`
/// field: `base = pcr / 300` (33 bits) and `ext = pcr % 300` (9 bits).
pub fn encode_pcr(pcr: u64) -> [u8; 6] {
    let base = pcr / 300;
    let ext = pcr % 300;

    let mut out = [0u8; 6];
    out[0] = ((base >> 25) & 0xFF) as u8;
    out[1] = ((base >> 17) & 0xFF) as u8;
    out[2] = ((base >> 9) & 0xFF) as u8;
    out[3] = ((base >> 1) & 0xFF) as u8;
    out[4] = (((base & 0x01) as u8) << 7) | 0x7E | (((ext >> 8) & 0x01) as u8);
    out[5] = (ext & 0xFF) as u8;
    out
}

/// Tracks per-PID continuity counters (4-bit, wraps `15 -> 0`).
#[derive(Debug, Default)]
pub struct ContinuityCounters {
    counters: HashMap<u16, u8>,
}

impl ContinuityCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next counter value for `pid` and advances it.
    pub fn next(&mut self, pid: u16) -> u8 {
        let counter = self.counters.entry(pid).or_insert(0);
        let value = *counter;
        *counter = (value + 1) & 0x0F;
        value
    }
}

/// Splits `payload` into a sequence of 188-byte TS packets for `pid`,
/// setting `payload_unit_start_indicator` on the first packet and stuffing
/// the final packet with `0xFF` to reach the full packet size.
///
/// `pcr` supplies a PCR value to embed in the first packet's adaptation
/// field (used for PCR-bearing packets); `random_access` sets the
/// random_access_indicator, typically on the first packet of a keyframe.
pub fn packetize(
    pid: u16,
    payload: &[u8],
    counters: &mut ContinuityCounters,
    pcr: Option<u64>,
    random_access: bool,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(((payload.len() / (PACKET_SIZE - 4)) + 1) * PACKET_SIZE);
    let mut offset = 0;
    let mut first = true;

    while first || offset < payload.len() {
        let mut packet = Vec::with_capacity(PACKET_SIZE);
        packet.push(SYNC_BYTE);

        let pusi = first;
        let mut byte1 = ((pid >> 8) & 0x1F) as u8;
        if pusi {
            byte1 |= 0x40;
        }
        packet.push(byte1);
        packet.push((pid & 0xFF) as u8);

        let continuity = counters.next(pid);

        let needs_adaptation = first && (pcr.is_some() || random_access);
        let remaining_payload = payload.len() - offset;
        let header_len = 4;
        let max_payload_this_packet = PACKET_SIZE - header_len;

        if needs_adaptation {
            let adaptation_field = build_adaptation_field(pcr, random_access && first, 0);
            // Compute how much stuffing is needed once we know the payload we can fit.
            let room_for_payload = max_payload_this_packet.saturating_sub(adaptation_field.len());
            let take = remaining_payload.min(room_for_payload);
            let stuffing = room_for_payload - take;

            let adaptation_field = build_adaptation_field(pcr, random_access && first, stuffing);
            packet.push(0x30 | continuity); // adaptation field + payload present
            packet.extend_from_slice(&adaptation_field);
            packet.extend_from_slice(&payload[offset..offset + take]);
            offset += take;
        } else if remaining_payload > 0 {
            let take = remaining_payload.min(max_payload_this_packet);
            let stuffing = max_payload_this_packet - take;
            if stuffing > 0 {
                let adaptation_field = build_adaptation_field(None, false, stuffing.saturating_sub(2));
                packet.push(0x30 | continuity);
                packet.extend_from_slice(&adaptation_field);
            } else {
                packet.push(0x10 | continuity); // payload only
            }
            packet.extend_from_slice(&payload[offset..offset + take]);
            offset += take;
        } else {
            // No payload left but we still need to emit a packet (pure adaptation, only
            // reachable if pusi fired with an empty payload -- not expected in practice).
            packet.push(0x20 | continuity);
            let adaptation_field = build_adaptation_field(None, false, max_payload_this_packet - 2);
            packet.extend_from_slice(&adaptation_field);
        }

        debug_assert_eq!(packet.len(), PACKET_SIZE);
        out.extend_from_slice(&packet);
        first = false;
    }

    out
}

/// Builds an adaptation field with `stuffing_len` trailing `0xFF` bytes,
/// optionally carrying a PCR and/or the random_access_indicator.
fn build_adaptation_field(pcr: Option<u64>, random_access: bool, stuffing_len: usize) -> Vec<u8> {
    let pcr_flag = pcr.is_some();
    let body_len = if pcr_flag { 1 + 6 } else { 1 };
    let adaptation_field_length = body_len + stuffing_len;

    let mut out = Vec::with_capacity(1 + adaptation_field_length);
    out.push(adaptation_field_length as u8);

    let mut flags = 0x00;
    if random_access {
        flags |= 0x40;
    }
    if pcr_flag {
        flags |= 0x10;
    }
    out.push(flags);

    if let Some(pcr) = pcr {
        out.extend_from_slice(&encode_pcr(pcr));
    }

    out.extend(std::iter::repeat(0xFFu8).take(stuffing_len));
    out
}
