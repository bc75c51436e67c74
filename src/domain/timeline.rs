//! Merged, chronologically ordered timeline of all document histories.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::domain::chrono_key::{self, ChronoKey};
use crate::domain::entities::DATE_KEY;
use crate::domain::error::{ChronoDecodeError, DomainResult};

/// Key under which an event records its owning document.
pub const SOURCE_KEY: &str = "Source";

/// A single dated event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Title of the owning document
    pub source: String,
    /// Date as written
    pub date: String,
    pub key: ChronoKey,
    /// Remaining fields, passed through untouched
    pub payload: Mapping,
}

impl Event {
    /// Decode a raw event record.
    pub fn decode(raw: &Value, source: &str) -> Result<Self, ChronoDecodeError> {
        let mut payload = match raw {
            Value::Mapping(map) => map.clone(),
            _ => Mapping::new(),
        };
        let date = match payload.shift_remove(DATE_KEY) {
            Some(Value::String(s)) => s,
            Some(other) => yaml_scalar(&other).ok_or_else(|| missing_date(raw))?,
            None => return Err(missing_date(raw)),
        };
        payload.shift_remove(SOURCE_KEY);
        let key = chrono_key::decode(&date)?;
        Ok(Self {
            source: source.to_string(),
            date,
            key,
            payload,
        })
    }

    /// Event as a mapping for rendering: payload plus `Date` and `Source`.
    pub fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        map.insert(Value::from(DATE_KEY), Value::from(self.date.clone()));
        for (k, v) in &self.payload {
            map.insert(k.clone(), v.clone());
        }
        map.insert(Value::from(SOURCE_KEY), Value::from(self.source.clone()));
        Value::Mapping(map)
    }
}

/// Numbers written without quotes (`Date: 2020`) still count as dates.
fn yaml_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn missing_date(raw: &Value) -> ChronoDecodeError {
    ChronoDecodeError::MissingDate {
        event: serde_yaml::to_string(raw).unwrap_or_default().trim().to_string(),
    }
}

/// Stable ascending sort by key; equal keys keep their relative order.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by_key(|e| e.key);
}

/// Collects per-document histories into one global timeline.
#[derive(Debug, Default)]
pub struct TimelineAggregator {
    events: Vec<Event>,
}

impl TimelineAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode, locally sort and record the events of one document.
    ///
    /// Returns the document's own events in order, tagged with `title`.
    /// Documents must be pushed in processing order; that order breaks ties
    /// between equal keys of different documents.
    pub fn push_document(&mut self, title: &str, raw: &[Value]) -> DomainResult<Vec<Event>> {
        let mut events = raw
            .iter()
            .map(|r| Event::decode(r, title))
            .collect::<Result<Vec<_>, _>>()?;
        sort_events(&mut events);
        debug!("{}: {} timeline events", title, events.len());
        self.events.extend(events.iter().cloned());
        Ok(events)
    }

    /// Final stable sort across all documents.
    pub fn finish(mut self) -> Timeline {
        sort_events(&mut self.events);
        Timeline {
            events: self.events,
        }
    }
}

/// Globally ordered events of all documents.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Vec<Event>,
}

impl Timeline {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Sequence(self.events.iter().map(Event::to_value).collect())
    }
}
