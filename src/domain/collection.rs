use super::event::{Category, Event};
use crate::error::{Result, ScannerError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// The (month, year) pair a collection is loaded for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionScope {
    pub month: u32,
    pub year: i32,
}

impl CollectionScope {
    pub fn new(month: u32, year: i32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ScannerError::Validation(
                "Month must be between 1 and 12".to_string(),
            ));
        }
        Ok(Self { month, year })
    }

    pub fn current() -> Self {
        use chrono::Datelike;
        let now = chrono::Local::now();
        Self {
            month: now.month(),
            year: now.year(),
        }
    }
}

impl fmt::Display for CollectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Result of applying a watched flag to the in-memory collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchChange {
    Changed,
    Unchanged,
    Missing,
}

/// Month-scoped set of events with the server's category index and counters.
///
/// The category buckets are taken from the server as-is and never recomputed
/// locally; the only mutation allowed is [`EventCollection::apply_watch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCollection {
    events: Vec<Event>,
    #[serde(default, deserialize_with = "merge_category_buckets")]
    events_by_category: BTreeMap<Category, Vec<Event>>,
    total_events: usize,
    watched_count: usize,
    month: u32,
    year: i32,
}

impl EventCollection {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn buckets(&self) -> &BTreeMap<Category, Vec<Event>> {
        &self.events_by_category
    }

    pub fn bucket(&self, category: Category) -> &[Event] {
        self.events_by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_events(&self) -> usize {
        self.total_events
    }

    pub fn watched_count(&self) -> usize {
        self.watched_count
    }

    pub fn scope(&self) -> CollectionScope {
        CollectionScope {
            month: self.month,
            year: self.year,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn find(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    /// Checks the derived views against the canonical sequence: counters match,
    /// every bucket entry exists in the sequence with the same watched flag, and
    /// every event of the sequence sits in some bucket.
    pub fn is_consistent(&self) -> bool {
        let watched = self.events.iter().filter(|e| e.is_watched).count();
        if self.total_events != self.events.len() || self.watched_count != watched {
            return false;
        }

        let mut bucketed = HashSet::new();
        for (category, bucket) in &self.events_by_category {
            for entry in bucket {
                match self.find(&entry.id) {
                    Some(canonical)
                        if canonical.is_watched == entry.is_watched
                            && canonical.category == *category =>
                    {
                        bucketed.insert(entry.id.as_str());
                    }
                    _ => return false,
                }
            }
        }
        self.events.iter().all(|e| bucketed.contains(e.id.as_str()))
    }

    /// Sets the watched flag of `event_id` in the canonical sequence and in every
    /// bucket entry carrying that id, adjusting the watched counter by one.
    pub fn apply_watch(&mut self, event_id: &str, watched: bool) -> WatchChange {
        let Some(event) = self.events.iter_mut().find(|e| e.id == event_id) else {
            return WatchChange::Missing;
        };
        if event.is_watched == watched {
            return WatchChange::Unchanged;
        }
        event.is_watched = watched;

        for entry in self
            .events_by_category
            .values_mut()
            .flat_map(|bucket| bucket.iter_mut())
            .filter(|entry| entry.id == event_id)
        {
            entry.is_watched = watched;
        }

        if watched {
            self.watched_count += 1;
        } else {
            self.watched_count = self.watched_count.saturating_sub(1);
        }
        WatchChange::Changed
    }
}

/// Folds the server's string-keyed buckets into category keys, appending when
/// two raw keys resolve to the same category.
fn merge_category_buckets<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<Category, Vec<Event>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Vec<Event>>>::deserialize(deserializer)?.unwrap_or_default();
    let mut merged: BTreeMap<Category, Vec<Event>> = BTreeMap::new();
    for (name, events) in raw {
        merged
            .entry(Category::from_name(&name))
            .or_default()
            .extend(events);
    }
    Ok(merged)
}
