//! `PlaylistRenderer`: RFC 8216 media-playlist rendering with a strict tag order.

use crate::playlist::segment::LiveSegment;
use crate::playlist::sequence::MediaSequenceTracker;

/// `EXT-X-PLAYLIST-TYPE` value, or its absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistType {
    None,
    Event,
    Vod,
}

/// `EXT-X-START` attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartOffset {
    pub time_offset: f64,
    pub precise: bool,
}

/// Ambient metadata folded into a render pass: client tags, flags, and an
/// optional CMAF initialization-segment reference.
#[derive(Debug, Clone, Default)]
pub struct PlaylistMetadata {
    /// Verbatim lines inserted after `EXT-X-START` and before `EXT-X-MAP`
    /// (typically `#EXT-X-DATERANGE:` lines from a date-range manager).
    pub custom_tags: Vec<String>,
    pub independent_segments: bool,
    pub start_offset: Option<StartOffset>,
}

/// Everything needed to render one media playlist.
pub struct RenderContext<'a> {
    pub segments: &'a [LiveSegment],
    pub tracker: &'a MediaSequenceTracker,
    pub metadata: &'a PlaylistMetadata,
    /// Configuration fallback target duration, used only when `segments` is empty.
    pub target_duration_fallback: u64,
    pub playlist_type: PlaylistType,
    pub has_end_list: bool,
    pub version: u8,
    pub init_segment_uri: Option<&'a str>,
}

/// Renders an RFC 8216 media playlist from a [`RenderContext`].
pub struct PlaylistRenderer;

impl PlaylistRenderer {
    pub fn render(ctx: &RenderContext<'_>) -> String {
        let mut lines = Vec::new();

        lines.push("#EXTM3U".to_string());
        lines.push(format!("#EXT-X-VERSION:{}", ctx.version));

        let target_duration = target_duration(ctx.segments, ctx.target_duration_fallback);
        lines.push(format!("#EXT-X-TARGETDURATION:{target_duration}"));

        lines.push(format!("#EXT-X-MEDIA-SEQUENCE:{}", ctx.tracker.media_sequence()));

        if ctx.tracker.discontinuity_sequence() > 0 {
            lines.push(format!(
                "#EXT-X-DISCONTINUITY-SEQUENCE:{}",
                ctx.tracker.discontinuity_sequence()
            ));
        }

        match ctx.playlist_type {
            PlaylistType::Event => lines.push("#EXT-X-PLAYLIST-TYPE:EVENT".to_string()),
            PlaylistType::Vod => lines.push("#EXT-X-PLAYLIST-TYPE:VOD".to_string()),
            PlaylistType::None => {}
        }

        if ctx.metadata.independent_segments {
            lines.push("#EXT-X-INDEPENDENT-SEGMENTS".to_string());
        }

        if let Some(start) = ctx.metadata.start_offset {
            if start.precise {
                lines.push(format!("#EXT-X-START:TIME-OFFSET={},PRECISE=YES", format_duration(start.time_offset)));
            } else {
                lines.push(format!("#EXT-X-START:TIME-OFFSET={}", format_duration(start.time_offset)));
            }
        }

        for tag in &ctx.metadata.custom_tags {
            lines.push(tag.clone());
        }

        if let Some(uri) = ctx.init_segment_uri {
            lines.push(format!("#EXT-X-MAP:URI=\"{uri}\""));
        }

        for segment in ctx.segments {
            if ctx.tracker.has_discontinuity(segment.index) {
                lines.push("#EXT-X-DISCONTINUITY".to_string());
            }
            if segment.is_gap {
                lines.push("#EXT-X-GAP".to_string());
            }
            if let Some(pdt) = segment.program_date_time {
                lines.push(format!(
                    "#EXT-X-PROGRAM-DATE-TIME:{}",
                    pdt.format("%Y-%m-%dT%H:%M:%S%.3fZ")
                ));
            }
            lines.push(format!("#EXTINF:{},", format_duration(segment.duration)));
            lines.push(segment.filename.clone());
        }

        if ctx.has_end_list {
            lines.push("#EXT-X-ENDLIST".to_string());
        }

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }
}

fn target_duration(segments: &[LiveSegment], fallback: u64) -> u64 {
    segments
        .iter()
        .map(|s| s.duration.ceil() as u64)
        .max()
        .unwrap_or(fallback)
}

/// Formats a duration with 3-decimal precision, trimming trailing zeros
/// down to (but not past) one decimal place.
pub fn format_duration(seconds: f64) -> String {
    let mut formatted = format!("{seconds:.3}");
    while formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.push('0');
    }
    formatted
}
