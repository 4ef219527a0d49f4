use crate::constants::ALL_CATEGORIES;
use crate::domain::{Category, Event, EventCollection};
use std::fmt;
use std::str::FromStr;

/// Category restriction applied by [`project`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    fn admits(&self, event: &Event) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => event.category == *category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(ALL_CATEGORIES) {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Only(category) => write!(f, "{category}"),
        }
    }
}

/// Events of the canonical sequence that pass both filters, in collection order.
///
/// Works off `events()` only; the server buckets are not consulted.
pub fn project<'a>(
    collection: &'a EventCollection,
    category: &CategoryFilter,
    watched_only: bool,
) -> Vec<&'a Event> {
    collection
        .events()
        .iter()
        .filter(|event| category.admits(event))
        .filter(|event| !watched_only || event.is_watched)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn event(id: &str, category: &str, watched: bool) -> Value {
        json!({
            "id": id,
            "title": id,
            "dateTime": "2025-11-03T09:00:00",
            "location": "Toronto",
            "sourceUrl": "https://lu.ma/x",
            "platform": "luma",
            "category": category,
            "aiRelevanceScore": 6,
            "tags": [],
            "isWatched": watched,
            "createdAt": "2025-10-01T00:00:00"
        })
    }

    fn collection() -> EventCollection {
        let events = vec![
            event("w1", "Workshop", false),
            event("t1", "Talk", true),
            event("w2", "Workshop", true),
        ];
        // Buckets deliberately disagree with the sequence to show they are ignored
        serde_json::from_value(json!({
            "events": events,
            "eventsByCategory": {"Workshop": [], "Talk": []},
            "totalEvents": 3,
            "watchedCount": 2,
            "month": 11,
            "year": 2025
        }))
        .unwrap()
    }

    fn ids(events: Vec<&Event>) -> Vec<&str> {
        events.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn all_without_watched_filter_keeps_everything_in_order() {
        let c = collection();
        assert_eq!(ids(project(&c, &CategoryFilter::All, false)), ["w1", "t1", "w2"]);
    }

    #[test]
    fn category_and_watched_filters_combine() {
        let c = collection();
        let workshops = CategoryFilter::Only(Category::Workshop);
        assert_eq!(ids(project(&c, &workshops, false)), ["w1", "w2"]);
        assert_eq!(ids(project(&c, &workshops, true)), ["w2"]);
        assert_eq!(ids(project(&c, &CategoryFilter::All, true)), ["t1", "w2"]);
    }

    #[test]
    fn projection_is_repeatable_and_leaves_input_alone() {
        let c = collection();
        let before = c.clone();
        let filter = CategoryFilter::Only(Category::Talk);
        let first = ids(project(&c, &filter, false));
        let second = ids(project(&c, &filter, false));
        assert_eq!(first, second);
        assert_eq!(c, before);
    }

    #[test]
    fn lowercase_category_lands_in_matching_bucket_and_view() {
        let talk = event("t1", "talk", false);
        let c: EventCollection = serde_json::from_value(json!({
            "events": [talk.clone()],
            "eventsByCategory": {"talk": [talk]},
            "totalEvents": 1,
            "watchedCount": 0,
            "month": 11,
            "year": 2025
        }))
        .unwrap();

        assert_eq!(c.events()[0].category, Category::Talk);
        assert_eq!(c.bucket(Category::Talk).len(), 1);
        assert!(c.is_consistent());
        assert_eq!(ids(project(&c, &CategoryFilter::Only(Category::Talk), false)), ["t1"]);
    }

    #[test]
    fn filter_parses_all_sentinel() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Hackathon".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Hackathon)
        );
        assert!("Party".parse::<CategoryFilter>().is_err());
        assert_eq!(CategoryFilter::All.to_string(), "All");
    }
}
