//! `ManagedDateRange` lifecycle and the `DateRangeManager` that owns it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Lifecycle state of a [`ManagedDateRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeState {
    Open,
    Closed,
    Expired,
}

/// One `EXT-X-DATERANGE` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedDateRange {
    pub id: String,
    pub class: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub planned_duration: Option<f64>,
    pub end_on_next: bool,
    pub custom_attributes: HashMap<String, String>,
    pub scte35_cmd: Option<String>,
    pub scte35_out: Option<String>,
    pub scte35_in: Option<String>,
    pub state: DateRangeState,
}

impl ManagedDateRange {
    /// The effective end: `end_date`, else `start_date + duration`.
    pub fn effective_end(&self) -> Option<DateTime<Utc>> {
        self.end_date.or_else(|| {
            self.duration.map(|d| self.start_date + chrono::Duration::milliseconds((d * 1000.0) as i64))
        })
    }

    /// Renders this range's `#EXT-X-DATERANGE:` line. Attribute order is
    /// deterministic: standard attributes first, then custom attributes in
    /// insertion order.
    pub fn render(&self, ordered_custom_keys: &[String]) -> String {
        let mut attrs = vec![format!("ID=\"{}\"", self.id)];
        if let Some(class) = &self.class {
            attrs.push(format!("CLASS=\"{class}\""));
        }
        attrs.push(format!("START-DATE=\"{}\"", self.start_date.format("%Y-%m-%dT%H:%M:%S%.3fZ")));
        if let Some(end_date) = self.end_date {
            attrs.push(format!("END-DATE=\"{}\"", end_date.format("%Y-%m-%dT%H:%M:%S%.3fZ")));
        }
        if let Some(duration) = self.duration {
            attrs.push(format!("DURATION={duration}"));
        }
        if let Some(planned) = self.planned_duration {
            attrs.push(format!("PLANNED-DURATION={planned}"));
        }
        if self.end_on_next {
            attrs.push("END-ON-NEXT=YES".to_string());
        }
        if let Some(cmd) = &self.scte35_cmd {
            attrs.push(format!("SCTE35-CMD={cmd}"));
        }
        if let Some(out) = &self.scte35_out {
            attrs.push(format!("SCTE35-OUT={out}"));
        }
        if let Some(r#in) = &self.scte35_in {
            attrs.push(format!("SCTE35-IN={in}"));
        }
        for key in ordered_custom_keys {
            if let Some(value) = self.custom_attributes.get(key) {
                attrs.push(format!("{key}=\"{value}\""));
            }
        }
        format!("#EXT-X-DATERANGE:{}", attrs.join(","))
    }
}

struct Entry {
    range: ManagedDateRange,
    custom_key_order: Vec<String>,
}

/// Insertion-ordered `id -> Entry` store with an O(1) lookup side map,
/// the same discipline `DVRBuffer` uses for its index side map.
#[derive(Default)]
struct OrderedEntries {
    order: Vec<(String, Entry)>,
    positions: HashMap<String, usize>,
}

impl OrderedEntries {
    fn insert(&mut self, id: String, entry: Entry) {
        if let Some(&pos) = self.positions.get(&id) {
            self.order[pos].1 = entry;
            return;
        }
        self.positions.insert(id.clone(), self.order.len());
        self.order.push((id, entry));
    }

    fn get(&self, id: &str) -> Option<&Entry> {
        self.positions.get(id).map(|&pos| &self.order[pos].1)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.positions.get(id).map(|&pos| &mut self.order[pos].1)
    }

    fn values(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().map(|(_, entry)| entry)
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.order.iter_mut().map(|(_, entry)| entry)
    }

    fn retain(&mut self, mut keep: impl FnMut(&Entry) -> bool) {
        self.order.retain(|(_, entry)| keep(entry));
        self.positions.clear();
        for (pos, (id, _)) in self.order.iter().enumerate() {
            self.positions.insert(id.clone(), pos);
        }
    }
}

/// Async, insertion-ordered `id -> ManagedDateRange` store.
#[derive(Default)]
pub struct DateRangeManager {
    entries: Mutex<OrderedEntries>,
}

impl DateRangeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(
        &self,
        id: impl Into<String>,
        start_date: DateTime<Utc>,
        class: Option<String>,
        planned_duration: Option<f64>,
        custom_attributes: HashMap<String, String>,
    ) -> Result<()> {
        let id = id.into();
        let mut entries = self.entries.lock().await;
        let custom_key_order: Vec<String> = custom_attributes.keys().cloned().collect();
        let range = ManagedDateRange {
            id: id.clone(),
            class,
            start_date,
            end_date: None,
            duration: None,
            planned_duration,
            end_on_next: false,
            custom_attributes,
            scte35_cmd: None,
            scte35_out: None,
            scte35_in: None,
            state: DateRangeState::Open,
        };
        entries.insert(id, Entry { range, custom_key_order });
        Ok(())
    }

    pub async fn update(&self, id: &str, custom_attributes: HashMap<String, String>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| Error::UnknownDateRangeId(id.to_string()))?;
        for (key, value) in custom_attributes {
            if !entry.range.custom_attributes.contains_key(&key) {
                entry.custom_key_order.push(key.clone());
            }
            entry.range.custom_attributes.insert(key, value);
        }
        Ok(())
    }

    pub async fn close(&self, id: &str, end_date: Option<DateTime<Utc>>, duration: Option<f64>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| Error::UnknownDateRangeId(id.to_string()))?;
        entry.range.end_date = end_date;
        entry.range.duration = duration;
        entry.range.state = DateRangeState::Closed;
        Ok(())
    }

    pub async fn expire(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| Error::UnknownDateRangeId(id.to_string()))?;
        entry.range.state = DateRangeState::Expired;
        Ok(())
    }

    /// Expires every `closed` range whose effective end predates `cutoff`.
    pub async fn evict_before(&self, cutoff: DateTime<Utc>) {
        let mut entries = self.entries.lock().await;
        for entry in entries.values_mut() {
            if entry.range.state == DateRangeState::Closed {
                if let Some(effective_end) = entry.range.effective_end() {
                    if effective_end < cutoff {
                        entry.range.state = DateRangeState::Expired;
                    }
                }
            }
        }
    }

    /// Removes every `expired` entry.
    pub async fn purge_expired(&self) {
        let mut entries = self.entries.lock().await;
        entries.retain(|entry| entry.range.state != DateRangeState::Expired);
    }

    /// Returns a clone of the range with `id`, if present.
    pub async fn get(&self, id: &str) -> Option<ManagedDateRange> {
        let entries = self.entries.lock().await;
        entries.get(id).map(|entry| entry.range.clone())
    }

    /// One `#EXT-X-DATERANGE:` line per non-expired range, in insertion order.
    pub async fn render_date_ranges(&self) -> Vec<String> {
        let entries = self.entries.lock().await;
        entries
            .values()
            .filter(|entry| entry.range.state != DateRangeState::Expired)
            .map(|entry| entry.range.render(&entry.custom_key_order))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-07-26T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn open_close_expire_lifecycle() {
        let manager = DateRangeManager::new();
        manager.open("ad-1", now(), None, None, HashMap::new()).await.unwrap();
        assert_eq!(manager.get("ad-1").await.unwrap().state, DateRangeState::Open);

        manager.close("ad-1", Some(now()), None).await.unwrap();
        assert_eq!(manager.get("ad-1").await.unwrap().state, DateRangeState::Closed);

        manager.expire("ad-1").await.unwrap();
        assert_eq!(manager.get("ad-1").await.unwrap().state, DateRangeState::Expired);
    }

    #[tokio::test]
    async fn render_date_ranges_skips_expired_and_preserves_insertion_order() {
        let manager = DateRangeManager::new();
        manager.open("a", now(), None, None, HashMap::new()).await.unwrap();
        manager.open("b", now(), None, None, HashMap::new()).await.unwrap();
        manager.expire("a").await.unwrap();

        let rendered = manager.render_date_ranges().await;
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].contains("ID=\"b\""));
    }

    #[tokio::test]
    async fn update_merges_custom_attributes() {
        let manager = DateRangeManager::new();
        manager.open("a", now(), None, None, HashMap::new()).await.unwrap();
        manager.update("a", HashMap::from([("X-FOO".to_string(), "1".to_string())])).await.unwrap();
        let range = manager.get("a").await.unwrap();
        assert_eq!(range.custom_attributes.get("X-FOO"), Some(&"1".to_string()));
    }

    #[tokio::test]
    async fn unknown_id_fails() {
        let manager = DateRangeManager::new();
        assert!(manager.close("missing", None, None).await.is_err());
    }
}
