use jiff::Timestamp;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use snaplink_core::KeyValueStore;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{error, warn, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Key the journal is persisted under.
pub const JOURNAL_KEY: &str = "app_logs";
/// Events kept in memory.
pub const DEFAULT_CAPACITY: usize = 1_000;
/// Events written by [`EventJournal::persist`].
pub const PERSISTED_ENTRIES: usize = 100;
/// Events returned by [`EventJournal::entries`] when no limit is given.
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// One captured tracing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: Timestamp,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// A bounded, newest-first history of tracing events.
///
/// The journal is a [`Layer`]: once added to a subscriber it records every
/// event that passes the subscriber's filter. Clones share one buffer, so
/// the caller keeps a handle for querying after handing a clone to the
/// subscriber.
#[derive(Debug, Clone)]
pub struct EventJournal {
    entries: Arc<Mutex<VecDeque<JournalEntry>>>,
    capacity: usize,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)))),
            capacity,
        }
    }

    /// Adds an entry at the front, dropping the oldest beyond capacity.
    pub fn push(&self, entry: JournalEntry) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Newest-first entries, optionally restricted to one level.
    ///
    /// `limit` defaults to [`DEFAULT_QUERY_LIMIT`].
    pub fn entries(&self, level: Option<Level>, limit: Option<usize>) -> Vec<JournalEntry> {
        let limit = limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        self.entries
            .lock()
            .iter()
            .filter(|entry| level.map_or(true, |level| entry.level == level.as_str()))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Writes the newest [`PERSISTED_ENTRIES`] entries under [`JOURNAL_KEY`].
    ///
    /// Failures are logged and otherwise ignored.
    pub fn persist<K: KeyValueStore + ?Sized>(&self, kv: &K) {
        let snapshot: Vec<JournalEntry> = self
            .entries
            .lock()
            .iter()
            .take(PERSISTED_ENTRIES)
            .cloned()
            .collect();

        let encoded = match serde_json::to_string(&snapshot) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(error = %e, "failed to encode event journal");
                return;
            }
        };

        if let Err(e) = kv.set(JOURNAL_KEY, &encoded) {
            warn!(error = %e, "failed to persist event journal");
        }
    }

    /// Appends previously persisted entries behind the ones already held.
    ///
    /// A missing or unreadable value leaves the journal untouched.
    pub fn restore<K: KeyValueStore + ?Sized>(&self, kv: &K) {
        let stored = match kv.get(JOURNAL_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "failed to read persisted event journal");
                return;
            }
        };

        let restored: Vec<JournalEntry> = match serde_json::from_str(&stored) {
            Ok(restored) => restored,
            Err(e) => {
                warn!(error = %e, "persisted event journal is corrupt, ignoring it");
                return;
            }
        };

        let mut entries = self.entries.lock();
        entries.extend(restored);
        entries.truncate(self.capacity);
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for EventJournal {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        self.push(JournalEntry {
            timestamp: Timestamp::now(),
            level: metadata.level().as_str().to_string(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}
