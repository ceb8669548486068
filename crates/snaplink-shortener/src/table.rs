use snaplink_core::{KeyValueStore, LinkRecord, Result, ShortCode, ShortenerError};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Key the serialized table lives under.
pub const TABLE_KEY: &str = "shortened_urls";

/// All link records, keyed by short code.
///
/// The table is persisted as a single JSON object mapping each code to its
/// record. Iteration is in ascending code order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: BTreeMap<ShortCode, LinkRecord>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the table from `kv`.
    ///
    /// A missing value, an unreadable store or a corrupt blob all produce an
    /// empty table; startup never fails on persisted state.
    pub fn load<K: KeyValueStore + ?Sized>(kv: &K) -> Self {
        let stored = match kv.get(TABLE_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!(key = TABLE_KEY, "no stored links, starting empty");
                return Self::new();
            }
            Err(e) => {
                error!(key = TABLE_KEY, error = %e, "failed to load links from storage");
                return Self::new();
            }
        };

        match Self::from_json(&stored) {
            Ok(table) => {
                info!(key = TABLE_KEY, links = table.len(), "loaded links from storage");
                table
            }
            Err(e) => {
                error!(key = TABLE_KEY, error = %e, "stored links are corrupt, starting empty");
                Self::new()
            }
        }
    }

    /// Writes the whole table to `kv`.
    ///
    /// Persistence is best effort: failures are logged and the in-memory
    /// table stays authoritative. Returns whether the write succeeded.
    pub fn save<K: KeyValueStore + ?Sized>(&self, kv: &K) -> bool {
        let encoded = match self.to_json() {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(error = %e, "failed to encode links");
                return false;
            }
        };

        match kv.set(TABLE_KEY, &encoded) {
            Ok(()) => {
                debug!(key = TABLE_KEY, links = self.len(), "links saved to storage");
                true
            }
            Err(e) => {
                error!(key = TABLE_KEY, error = %e, "failed to save links to storage");
                false
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.links)
    }

    /// Parses a serialized table.
    ///
    /// Only a blob that is not a JSON object fails. Each record is checked on
    /// its own and skipped with a warning when invalid. Records are re-keyed
    /// by their own short code, so a blob whose keys disagree with the
    /// records still yields a consistent table.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut links = BTreeMap::new();
        for (key, value) in raw {
            let record: LinkRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping invalid stored link");
                    continue;
                }
            };
            if key != record.short_code().as_str() {
                warn!(key = %key, short_code = %record.short_code(), "stored key does not match record, using record code");
            }
            links.insert(record.short_code().clone(), record);
        }
        Ok(Self { links })
    }

    pub fn contains(&self, code: &str) -> bool {
        self.links.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&LinkRecord> {
        self.links.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut LinkRecord> {
        self.links.get_mut(code)
    }

    /// Adds a record, refusing to replace an existing code.
    pub fn insert(&mut self, record: LinkRecord) -> Result<()> {
        if self.contains(record.short_code().as_str()) {
            return Err(ShortenerError::CodeTaken(record.short_code().to_string()));
        }
        self.links.insert(record.short_code().clone(), record);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkRecord> {
        self.links.values()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
