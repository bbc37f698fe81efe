//! HLS Interstitials: ad/bumper/cue authoring atop a [`DateRangeManager`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::metadata::daterange::{DateRangeManager, DateRangeState, ManagedDateRange};
use crate::metadata::scte35::SCTE35Marker;

/// What an interstitial points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterstitialAsset {
    Uri(String),
    List(String),
}

/// Playback restrictions carried by an interstitial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restrictions {
    pub jump: bool,
    pub seek: bool,
}

/// Where playback resumes once the interstitial completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResumeMode {
    LiveEdge,
    Offset(f64),
    Date(DateTime<Utc>),
}

/// Client-side skip button configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipControl {
    pub skip_after: f64,
    pub button_start: f64,
}

/// Preload hint for the interstitial's content.
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadConfig {
    pub preload_uri: String,
    pub preload_ahead: f64,
}

/// An ad/bumper/cue sitting atop a `ManagedDateRange` with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct HLSInterstitial {
    pub id: String,
    pub asset: InterstitialAsset,
    pub restrictions: Restrictions,
    pub resume_mode: ResumeMode,
    pub skip_control: Option<SkipControl>,
    pub preload: Option<PreloadConfig>,
    pub scte35: Option<SCTE35Marker>,
    pub start_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn format_f64(value: f64) -> String {
    let mut s = format!("{value:.3}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.push('0');
    }
    s
}

impl HLSInterstitial {
    /// Converts this interstitial's authoring data into the custom
    /// attributes a [`DateRangeManager`] entry should carry.
    pub fn to_custom_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        match &self.asset {
            InterstitialAsset::Uri(uri) => {
                attrs.insert("X-ASSET-URI".to_string(), uri.clone());
            }
            InterstitialAsset::List(uri) => {
                attrs.insert("X-ASSET-LIST".to_string(), uri.clone());
            }
        }

        let mut restrictions = Vec::new();
        if self.restrictions.jump {
            restrictions.push("JUMP");
        }
        if self.restrictions.seek {
            restrictions.push("SEEK");
        }
        if !restrictions.is_empty() {
            restrictions.sort_unstable();
            attrs.insert("X-RESTRICT".to_string(), restrictions.join(","));
        }

        match self.resume_mode {
            ResumeMode::LiveEdge => {}
            ResumeMode::Offset(offset) => {
                attrs.insert("X-RESUME-OFFSET".to_string(), format_f64(offset));
            }
            ResumeMode::Date(date) => {
                attrs.insert("X-RESUME-OFFSET".to_string(), date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());
            }
        }

        if let Some(skip) = &self.skip_control {
            attrs.insert("X-SKIP-AFTER".to_string(), format_f64(skip.skip_after));
            attrs.insert("X-SKIP-BUTTON-START".to_string(), format_f64(skip.button_start));
        }

        if let Some(preload) = &self.preload {
            attrs.insert("X-com.apple.hls.preload".to_string(), preload.preload_uri.clone());
            attrs.insert("X-PRELOAD-AHEAD".to_string(), format_f64(preload.preload_ahead));
        }

        attrs
    }

    /// Reconstructs an interstitial from a date range's custom attributes.
    /// Returns `None` when neither `X-ASSET-URI` nor `X-ASSET-LIST` is present.
    pub fn from_date_range(range: &ManagedDateRange) -> Option<Self> {
        let asset = if let Some(uri) = range.custom_attributes.get("X-ASSET-URI") {
            InterstitialAsset::Uri(uri.clone())
        } else if let Some(uri) = range.custom_attributes.get("X-ASSET-LIST") {
            InterstitialAsset::List(uri.clone())
        } else {
            return None;
        };

        let restrict = range.custom_attributes.get("X-RESTRICT").map(String::as_str).unwrap_or("");
        let restrictions = Restrictions {
            jump: restrict.split(',').any(|s| s == "JUMP"),
            seek: restrict.split(',').any(|s| s == "SEEK"),
        };

        let resume_mode = range
            .custom_attributes
            .get("X-RESUME-OFFSET")
            .map(|raw| {
                if let Ok(offset) = raw.parse::<f64>() {
                    ResumeMode::Offset(offset)
                } else if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
                    ResumeMode::Date(date.with_timezone(&Utc))
                } else {
                    ResumeMode::LiveEdge
                }
            })
            .unwrap_or(ResumeMode::LiveEdge);

        let skip_control = match (
            range.custom_attributes.get("X-SKIP-AFTER").and_then(|v| v.parse::<f64>().ok()),
            range.custom_attributes.get("X-SKIP-BUTTON-START").and_then(|v| v.parse::<f64>().ok()),
        ) {
            (Some(skip_after), Some(button_start)) => Some(SkipControl { skip_after, button_start }),
            _ => None,
        };

        let preload = match (
            range.custom_attributes.get("X-com.apple.hls.preload"),
            range.custom_attributes.get("X-PRELOAD-AHEAD").and_then(|v| v.parse::<f64>().ok()),
        ) {
            (Some(uri), Some(ahead)) => Some(PreloadConfig { preload_uri: uri.clone(), preload_ahead: ahead }),
            _ => None,
        };

        Some(Self {
            id: range.id.clone(),
            asset,
            restrictions,
            resume_mode,
            skip_control,
            preload,
            scte35: None,
            start_date: range.start_date,
            completed_at: range.end_date,
        })
    }
}

/// Authors [`HLSInterstitial`] values, optionally backed by a shared
/// [`DateRangeManager`] (every scheduled interstitial also opens a date
/// range with the same id).
pub struct InterstitialManager {
    interstitials: Mutex<HashMap<String, HLSInterstitial>>,
    date_ranges: Option<Arc<DateRangeManager>>,
}

impl InterstitialManager {
    pub fn new(date_ranges: Option<Arc<DateRangeManager>>) -> Self {
        Self { interstitials: Mutex::new(HashMap::new()), date_ranges }
    }

    async fn schedule(&self, interstitial: HLSInterstitial) -> Result<()> {
        if let Some(date_ranges) = &self.date_ranges {
            date_ranges
                .open(
                    interstitial.id.clone(),
                    interstitial.start_date,
                    Some("com.apple.hls.interstitial".to_string()),
                    None,
                    interstitial.to_custom_attributes(),
                )
                .await?;
        }
        self.interstitials.lock().await.insert(interstitial.id.clone(), interstitial);
        Ok(())
    }

    pub async fn schedule_ad(
        &self,
        id: impl Into<String>,
        asset: InterstitialAsset,
        start_date: DateTime<Utc>,
        resume_mode: ResumeMode,
    ) -> Result<()> {
        self.schedule(HLSInterstitial {
            id: id.into(),
            asset,
            restrictions: Restrictions { jump: false, seek: false },
            resume_mode,
            skip_control: None,
            preload: None,
            scte35: None,
            start_date,
            completed_at: None,
        })
        .await
    }

    pub async fn schedule_bumper(
        &self,
        id: impl Into<String>,
        asset: InterstitialAsset,
        start_date: DateTime<Utc>,
    ) -> Result<()> {
        self.schedule(HLSInterstitial {
            id: id.into(),
            asset,
            restrictions: Restrictions { jump: true, seek: true },
            resume_mode: ResumeMode::LiveEdge,
            skip_control: None,
            preload: None,
            scte35: None,
            start_date,
            completed_at: None,
        })
        .await
    }

    pub async fn schedule_from_scte35(
        &self,
        id: impl Into<String>,
        asset: InterstitialAsset,
        start_date: DateTime<Utc>,
        marker: SCTE35Marker,
    ) -> Result<()> {
        self.schedule(HLSInterstitial {
            id: id.into(),
            asset,
            restrictions: Restrictions { jump: false, seek: false },
            resume_mode: ResumeMode::LiveEdge,
            skip_control: None,
            preload: None,
            scte35: Some(marker),
            start_date,
            completed_at: None,
        })
        .await
    }

    /// Closes the backing date range with `endDate = now` and marks completion.
    pub async fn complete(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        let mut interstitials = self.interstitials.lock().await;
        let interstitial = interstitials
            .get_mut(id)
            .ok_or_else(|| Error::UnknownDateRangeId(id.to_string()))?;
        interstitial.completed_at = Some(now);

        if let Some(date_ranges) = &self.date_ranges {
            date_ranges.close(id, Some(now), None).await?;
        }
        Ok(())
    }

    pub async fn interstitials(&self) -> Vec<HLSInterstitial> {
        self.interstitials.lock().await.values().cloned().collect()
    }

    pub async fn active_interstitials(&self, now: DateTime<Utc>) -> Vec<HLSInterstitial> {
        self.interstitials
            .lock()
            .await
            .values()
            .filter(|i| i.start_date <= now && i.completed_at.is_none())
            .cloned()
            .collect()
    }

    pub async fn completed_interstitials(&self) -> Vec<HLSInterstitial> {
        self.interstitials.lock().await.values().filter(|i| i.completed_at.is_some()).cloned().collect()
    }

    pub async fn upcoming(&self, after: DateTime<Utc>) -> Vec<HLSInterstitial> {
        self.interstitials.lock().await.values().filter(|i| i.start_date > after).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn schedule_ad_opens_a_matching_date_range() {
        let date_ranges = Arc::new(DateRangeManager::new());
        let manager = InterstitialManager::new(Some(date_ranges.clone()));
        manager
            .schedule_ad("ad-1", InterstitialAsset::Uri("https://example.com/ad.m3u8".to_string()), date("2026-07-26T00:00:00Z"), ResumeMode::LiveEdge)
            .await
            .unwrap();

        let range = date_ranges.get("ad-1").await.unwrap();
        assert_eq!(range.custom_attributes.get("X-ASSET-URI").unwrap(), "https://example.com/ad.m3u8");
    }

    #[tokio::test]
    async fn complete_closes_the_date_range() {
        let date_ranges = Arc::new(DateRangeManager::new());
        let manager = InterstitialManager::new(Some(date_ranges.clone()));
        manager
            .schedule_bumper("b-1", InterstitialAsset::Uri("https://example.com/b.m3u8".to_string()), date("2026-07-26T00:00:00Z"))
            .await
            .unwrap();

        manager.complete("b-1", date("2026-07-26T00:00:10Z")).await.unwrap();
        let range = date_ranges.get("b-1").await.unwrap();
        assert_eq!(range.state, DateRangeState::Closed);

        let completed = manager.completed_interstitials().await;
        assert_eq!(completed.len(), 1);
    }

    #[test]
    fn restrictions_render_sorted_and_comma_separated() {
        let interstitial = HLSInterstitial {
            id: "x".to_string(),
            asset: InterstitialAsset::Uri("u".to_string()),
            restrictions: Restrictions { jump: true, seek: true },
            resume_mode: ResumeMode::LiveEdge,
            skip_control: None,
            preload: None,
            scte35: None,
            start_date: date("2026-07-26T00:00:00Z"),
            completed_at: None,
        };
        let attrs = interstitial.to_custom_attributes();
        assert_eq!(attrs.get("X-RESTRICT").unwrap(), "JUMP,SEEK");
    }

    #[test]
    fn from_date_range_round_trips_asset_uri_and_restrictions() {
        let interstitial = HLSInterstitial {
            id: "x".to_string(),
            asset: InterstitialAsset::Uri("u".to_string()),
            restrictions: Restrictions { jump: true, seek: false },
            resume_mode: ResumeMode::Offset(12.5),
            skip_control: Some(SkipControl { skip_after: 5.0, button_start: 1.0 }),
            preload: None,
            scte35: None,
            start_date: date("2026-07-26T00:00:00Z"),
            completed_at: None,
        };

        let range = ManagedDateRange {
            id: interstitial.id.clone(),
            class: None,
            start_date: interstitial.start_date,
            end_date: None,
            duration: None,
            planned_duration: None,
            end_on_next: false,
            custom_attributes: interstitial.to_custom_attributes(),
            scte35_cmd: None,
            scte35_out: None,
            scte35_in: None,
            state: DateRangeState::Open,
        };

        let recovered = HLSInterstitial::from_date_range(&range).unwrap();
        assert_eq!(recovered.asset, InterstitialAsset::Uri("u".to_string()));
        assert_eq!(recovered.restrictions, Restrictions { jump: true, seek: false });
        assert_eq!(recovered.resume_mode, ResumeMode::Offset(12.5));
    }

    #[test]
    fn from_date_range_round_trips_resume_mode_date() {
        let resume_date = date("2026-07-26T01:30:00Z");
        let interstitial = HLSInterstitial {
            id: "x".to_string(),
            asset: InterstitialAsset::Uri("u".to_string()),
            restrictions: Restrictions { jump: false, seek: false },
            resume_mode: ResumeMode::Date(resume_date),
            skip_control: None,
            preload: None,
            scte35: None,
            start_date: date("2026-07-26T00:00:00Z"),
            completed_at: None,
        };

        let range = ManagedDateRange {
            id: interstitial.id.clone(),
            class: None,
            start_date: interstitial.start_date,
            end_date: None,
            duration: None,
            planned_duration: None,
            end_on_next: false,
            custom_attributes: interstitial.to_custom_attributes(),
            scte35_cmd: None,
            scte35_out: None,
            scte35_in: None,
            state: DateRangeState::Open,
        };

        let recovered = HLSInterstitial::from_date_range(&range).unwrap();
        assert_eq!(recovered.resume_mode, ResumeMode::Date(resume_date));
    }

    #[test]
    fn from_date_range_returns_none_without_an_asset() {
        let range = ManagedDateRange {
            id: "x".to_string(),
            class: None,
            start_date: date("2026-07-26T00:00:00Z"),
            end_date: None,
            duration: None,
            planned_duration: None,
            end_on_next: false,
            custom_attributes: HashMap::new(),
            scte35_cmd: None,
            scte35_out: None,
            scte35_in: None,
            state: DateRangeState::Open,
        };
        assert!(HLSInterstitial::from_date_range(&range).is_none());
    }
}
