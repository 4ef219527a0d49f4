#![allow(dead_code)]

use ai_event_scanner::app::{ApiRequest, TransportPort};
use ai_event_scanner::error::TransportError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

type Reply = Result<Value, TransportError>;

/// Pair of signals for a call parked inside the transport
#[derive(Clone)]
pub struct Held {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// In-memory backend answering by "METHOD /path".
///
/// Replies queued for a route are handed out in order; the last one is repeated
/// for any further calls. Unknown routes answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    holds: Mutex<HashMap<String, Held>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn reply(&self, route: &str, reply: Reply) {
        self.replies
            .lock()
            .await
            .entry(route.to_string())
            .or_default()
            .push_back(reply);
    }

    pub async fn ok(&self, route: &str, body: Value) {
        self.reply(route, Ok(body)).await;
    }

    /// Parks the next call to `route` until `release` is notified
    pub async fn hold(&self, route: &str) -> Held {
        let held = Held {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        self.holds.lock().await.insert(route.to_string(), held.clone());
        held
    }

    pub async fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().await.clone()
    }

    pub async fn calls_to(&self, route: &str) -> Vec<ApiRequest> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.route() == route)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransportPort for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let route = request.route();
        self.calls.lock().await.push(request);

        let held = self.holds.lock().await.remove(&route);
        if let Some(held) = held {
            held.entered.notify_one();
            held.release.notified().await;
        }

        let mut replies = self.replies.lock().await;
        match replies.get_mut(&route) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(TransportError::ServerError {
                status: 404,
                body: r#"{"detail":"Not Found"}"#.to_string(),
                message: Some("Not Found".to_string()),
            }),
        }
    }
}

pub const WATCH: &str = "POST /api/events/watch";
pub const DISCOVER: &str = "POST /api/events/discover-events";

pub fn month_route(month: u32, year: i32) -> String {
    format!("GET /api/events/{month}/{year}")
}

pub fn event(id: &str, category: &str, watched: bool) -> Value {
    json!({
        "id": id,
        "title": format!("AI meetup {id}"),
        "description": "Hands-on session",
        "dateTime": "2025-11-14T18:30:00",
        "location": "Berlin",
        "sourceUrl": format!("https://lu.ma/{id}"),
        "platform": "luma",
        "category": category,
        "aiRelevanceScore": 8,
        "tags": ["llm"],
        "organizer": "Berlin AI",
        "eventType": "In-Person",
        "price": null,
        "isWatched": watched,
        "createdAt": "2025-10-30T12:00:00"
    })
}

/// Collection body the way the backend builds it: buckets and counters derived from `events`
pub fn collection(month: u32, year: i32, events: Vec<Value>) -> Value {
    let mut buckets: Map<String, Value> = Map::new();
    for e in &events {
        let category = e["category"].as_str().unwrap_or("Other").to_string();
        buckets
            .entry(category)
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .unwrap()
            .push(e.clone());
    }
    let watched = events.iter().filter(|e| e["isWatched"] == true).count();
    json!({
        "events": events,
        "eventsByCategory": buckets,
        "totalEvents": events.len(),
        "watchedCount": watched,
        "month": month,
        "year": year
    })
}

pub fn watch_ok() -> Value {
    json!({"success": true, "message": "Event watch status updated"})
}
