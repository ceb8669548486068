use crate::settings::{StoreSettings, MAX_GENERATED_LENGTH};
use crate::table::LinkTable;
use jiff::Timestamp;
use parking_lot::Mutex;
use snaplink_core::record::{validate_url, validate_validity};
use snaplink_core::shortcode::MIN_LENGTH;
use snaplink_core::stats::{clicks_by_day, clicks_by_hour};
use snaplink_core::{
    ClickContext, Clock, KeyValueStore, LinkRecord, LinkStats, LinkStatus, LinkSummary, Result,
    ShortCode, ShortenRequest, Shortener, ShortenerError,
};
use snaplink_generator::Generator;
use tracing::{debug, info, trace, warn};

/// A concrete implementation of the [`Shortener`] trait.
///
/// The store owns the link table and handles:
/// - URL and validity validation
/// - Short code selection (custom or generated, with collision retry)
/// - Expiry evaluation and click recording
/// - Listing and click statistics
///
/// The whole table sits behind one mutex. Every operation takes it before
/// reading the clock and holds it until the final write-back, so concurrent
/// `shorten` and `resolve` calls never lose a click, hand out the same code
/// twice or append clicks out of time order.
pub struct ShortLinkStore<K, G, C> {
    table: Mutex<LinkTable>,
    kv: K,
    generator: G,
    clock: C,
    settings: StoreSettings,
}

impl<K: KeyValueStore, G: Generator, C: Clock> ShortLinkStore<K, G, C> {
    /// Creates a store, loading any previously persisted table from `kv`.
    pub fn new(kv: K, generator: G, clock: C, settings: StoreSettings) -> Self {
        let table = LinkTable::load(&kv);
        Self::with_table(kv, table, generator, clock, settings)
    }

    /// Creates a store around an already loaded table.
    ///
    /// `code_length` is clamped to the lengths a short code may have.
    pub fn with_table(
        kv: K,
        table: LinkTable,
        generator: G,
        clock: C,
        mut settings: StoreSettings,
    ) -> Self {
        let code_length = settings.code_length.clamp(MIN_LENGTH, MAX_GENERATED_LENGTH);
        if code_length != settings.code_length {
            warn!(
                requested = settings.code_length,
                code_length, "generated code length out of range, clamping"
            );
            settings.code_length = code_length;
        }

        Self {
            table: Mutex::new(table),
            kv,
            generator,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// The public URL of a short code under the configured base URL.
    pub fn short_url(&self, code: &ShortCode) -> String {
        code.to_url(&self.settings.base_url)
    }

    /// Picks a generated code that is not in `table`.
    ///
    /// Each length gets `max_attempts` draws; after that the length grows by
    /// one, up to [`MAX_GENERATED_LENGTH`].
    fn allocate_code(&self, table: &LinkTable) -> Result<ShortCode> {
        let attempts = self.settings.max_attempts.max(1);
        let mut length = self.settings.code_length;

        while length <= MAX_GENERATED_LENGTH {
            for attempt in 1..=attempts {
                let code = self.generator.generate(length);
                if !table.contains(code.as_str()) {
                    return Ok(code);
                }
                trace!(code = %code, attempt, "generated code collided");
            }
            warn!(length, attempts, "no free code at this length, widening");
            length += 1;
        }

        Err(ShortenerError::CodeSpaceExhausted {
            max_length: MAX_GENERATED_LENGTH,
        })
    }

    fn summarize(&self, record: &LinkRecord, now: Timestamp) -> LinkSummary {
        LinkSummary {
            record: record.clone(),
            short_url: self.short_url(record.short_code()),
            is_expired: record.is_expired_at(now),
        }
    }
}

impl<K: KeyValueStore, G: Generator, C: Clock> Shortener for ShortLinkStore<K, G, C> {
    fn shorten(&self, request: ShortenRequest) -> Result<LinkRecord> {
        info!(
            original_url = %request.original_url,
            custom_code = ?request.custom_code,
            validity_minutes = request.validity_minutes,
            "attempting to shorten URL"
        );

        if !validate_url(&request.original_url) {
            warn!(original_url = %request.original_url, "invalid URL format");
            return Err(ShortenerError::InvalidUrl(request.original_url));
        }
        validate_validity(request.validity_minutes)?;

        let mut table = self.table.lock();

        let short_code = match request.custom_code {
            Some(custom) => {
                let code = ShortCode::new(custom)?;
                if table.contains(code.as_str()) {
                    warn!(short_code = %code, "custom short code already exists");
                    return Err(ShortenerError::CodeTaken(code.to_string()));
                }
                code
            }
            None => self.allocate_code(&table)?,
        };

        let record = LinkRecord::new(
            short_code,
            request.original_url,
            self.clock.now(),
            request.validity_minutes,
        )?;
        table.insert(record.clone())?;
        table.save(&self.kv);

        info!(
            short_code = %record.short_code(),
            original_url = %record.original_url(),
            expires_at = %record.expires_at(),
            "URL shortened successfully"
        );
        Ok(record)
    }

    fn resolve(&self, code: &str, context: ClickContext) -> Option<String> {
        let mut table = self.table.lock();
        let now = self.clock.now();

        let Some(record) = table.get_mut(code) else {
            warn!(short_code = code, "short URL not found");
            return None;
        };

        if record.is_expired_at(now) {
            warn!(short_code = code, expires_at = %record.expires_at(), "short URL expired");
            return None;
        }

        record.record_click(context.into_event(now));
        let original_url = record.original_url().to_string();
        let clicks = record.clicks();

        table.save(&self.kv);

        info!(short_code = code, original_url = %original_url, clicks, "URL accessed");
        Some(original_url)
    }

    fn get(&self, code: &str) -> Option<LinkRecord> {
        let table = self.table.lock();
        let now = self.clock.now();

        match table.get(code) {
            Some(record) if record.is_expired_at(now) => {
                debug!(short_code = code, "lookup hit an expired link");
                None
            }
            Some(record) => Some(record.clone()),
            None => {
                debug!(short_code = code, "lookup missed");
                None
            }
        }
    }

    fn list_all(&self) -> Vec<LinkSummary> {
        let table = self.table.lock();
        let now = self.clock.now();
        table
            .iter()
            .map(|record| self.summarize(record, now))
            .collect()
    }

    fn stats_for(&self, code: &str) -> Option<LinkStats> {
        let table = self.table.lock();
        let now = self.clock.now();
        let record = table.get(code)?;

        let tz = &self.settings.time_zone;
        Some(LinkStats {
            clicks_by_hour: clicks_by_hour(record.click_history(), tz),
            clicks_by_day: clicks_by_day(record.click_history(), tz),
            summary: self.summarize(record, now),
        })
    }

    fn status(&self, code: &str) -> LinkStatus {
        let table = self.table.lock();
        let now = self.clock.now();

        match table.get(code) {
            Some(record) if record.is_expired_at(now) => LinkStatus::Expired(record.clone()),
            Some(record) => LinkStatus::Active(record.clone()),
            None => LinkStatus::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TABLE_KEY;
    use jiff::tz::TimeZone;
    use jiff::SignedDuration;
    use snaplink_core::stats::HourlyClicks;
    use snaplink_core::{CodeOrigin, ManualClock};
    use snaplink_generator::seq::SeqGenerator;
    use snaplink_generator::RandomGenerator;
    use snaplink_storage::InMemoryKvStore;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    type TestStore<G = RandomGenerator> = ShortLinkStore<Arc<InMemoryKvStore>, G, ManualClock>;

    /// Always proposes the same code for a given length.
    struct FixedGenerator;

    impl Generator for FixedGenerator {
        fn generate(&self, length: usize) -> ShortCode {
            ShortCode::generated("a".repeat(length))
        }
    }

    fn start() -> Timestamp {
        "2026-10-17T14:05:00Z".parse().unwrap()
    }

    fn settings() -> StoreSettings {
        StoreSettings::builder()
            .base_url("https://snap.link/")
            .time_zone(TimeZone::UTC)
            .build()
    }

    fn store_with<G: Generator>(generator: G) -> (TestStore<G>, ManualClock, Arc<InMemoryKvStore>) {
        let clock = ManualClock::new(start());
        let kv = Arc::new(InMemoryKvStore::new());
        let store = ShortLinkStore::new(kv.clone(), generator, clock.clone(), settings());
        (store, clock, kv)
    }

    fn test_store() -> (TestStore, ManualClock, Arc<InMemoryKvStore>) {
        store_with(RandomGenerator::new())
    }

    fn request(url: &str) -> ShortenRequest {
        ShortenRequest::builder().original_url(url).build()
    }

    fn custom(url: &str, code: &str) -> ShortenRequest {
        ShortenRequest::builder()
            .original_url(url)
            .custom_code(code.to_string())
            .build()
    }

    #[test]
    fn shorten_with_generated_code() {
        let (store, _, _) = test_store();

        let record = store.shorten(request("https://example.com")).unwrap();

        assert_eq!(record.short_code().as_str().len(), 6);
        assert!(record
            .short_code()
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(record.validity_minutes(), 30);
        assert_eq!(record.created_at(), start());
        assert_eq!(
            record.expires_at(),
            start() + SignedDuration::from_mins(30)
        );
        assert_eq!(record.clicks(), 0);
    }

    #[test]
    fn shortened_code_is_new_and_then_present() {
        let (store, _, _) = test_store();
        let before: Vec<_> = store.list_all();

        let record = store.shorten(request("https://example.com")).unwrap();

        assert!(before
            .iter()
            .all(|s| s.record.short_code() != record.short_code()));
        assert!(store.get(record.short_code().as_str()).is_some());
    }

    #[test]
    fn consecutive_generated_codes_differ() {
        let (store, _, _) = test_store();
        let first = store.shorten(request("https://example.com/1")).unwrap();
        let second = store.shorten(request("https://example.com/2")).unwrap();
        assert_ne!(first.short_code(), second.short_code());
    }

    #[test]
    fn shorten_with_custom_code() {
        let (store, _, _) = test_store();
        let record = store.shorten(custom("https://example.com", "MyLink")).unwrap();
        assert_eq!(record.short_code().as_str(), "MyLink");
        assert_eq!(record.short_code().origin(), CodeOrigin::Custom);
    }

    #[test]
    fn generated_codes_report_their_origin() {
        let (store, _, _) = test_store();
        let record = store.shorten(request("https://example.com")).unwrap();
        assert_eq!(record.short_code().origin(), CodeOrigin::Generated);
        assert_eq!(
            store
                .get(record.short_code().as_str())
                .unwrap()
                .short_code()
                .origin(),
            CodeOrigin::Generated
        );
    }

    #[test]
    fn custom_code_validation() {
        let (store, _, _) = test_store();

        assert!(matches!(
            store.shorten(custom("https://example.com", "ab")),
            Err(ShortenerError::InvalidLength { length: 2, .. })
        ));
        assert!(matches!(
            store.shorten(custom("https://example.com", "a b!")),
            Err(ShortenerError::InvalidFormat(_))
        ));
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn duplicate_custom_code_fails() {
        let (store, _, _) = test_store();

        store.shorten(custom("https://example1.com", "promo")).unwrap();
        let err = store
            .shorten(custom("https://example2.com", "promo"))
            .unwrap_err();

        assert_eq!(err, ShortenerError::CodeTaken("promo".to_string()));
        assert_eq!(
            store.get("promo").unwrap().original_url(),
            "https://example1.com"
        );
    }

    #[test]
    fn expired_custom_code_stays_taken() {
        let (store, clock, _) = test_store();
        store.shorten(custom("https://example.com", "promo")).unwrap();
        clock.advance(SignedDuration::from_hours(1));

        assert!(matches!(
            store.shorten(custom("https://example.com", "promo")),
            Err(ShortenerError::CodeTaken(_))
        ));
    }

    #[test]
    fn shorten_with_invalid_url_fails() {
        let (store, _, _) = test_store();
        let err = store.shorten(request("not-a-valid-url")).unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
    }

    #[test]
    fn invalid_url_is_reported_before_invalid_code() {
        let (store, _, _) = test_store();
        let err = store.shorten(custom("nope", "a b!")).unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
    }

    #[test]
    fn shorten_rejects_out_of_range_validity() {
        let (store, _, _) = test_store();
        for minutes in [0, 10_081] {
            let req = ShortenRequest::builder()
                .original_url("https://example.com")
                .validity_minutes(minutes)
                .build();
            assert!(matches!(
                store.shorten(req),
                Err(ShortenerError::InvalidValidityPeriod { .. })
            ));
        }
    }

    #[test]
    fn shorten_persists_the_table() {
        let (store, _, kv) = test_store();
        let record = store.shorten(request("https://example.com")).unwrap();

        let stored = kv.get(TABLE_KEY).unwrap().unwrap();
        assert!(stored.contains(record.short_code().as_str()));
    }

    #[test]
    fn resolve_records_click_and_expires() {
        let (store, clock, _) = test_store();
        let req = ShortenRequest::builder()
            .original_url("https://example.com/a")
            .validity_minutes(1)
            .build();
        let record = store.shorten(req).unwrap();
        let code = record.short_code().as_str();
        assert_eq!(record.validity_minutes(), 1);

        assert_eq!(
            store.resolve(code, ClickContext::default()),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(store.status(code), LinkStatus::Active(store.get(code).unwrap()));
        let stats = store.stats_for(code).unwrap();
        assert_eq!(stats.summary.record.clicks(), 1);

        clock.advance(SignedDuration::from_secs(61));

        assert_eq!(store.resolve(code, ClickContext::default()), None);
        assert_eq!(store.get(code), None);
        assert!(matches!(store.status(code), LinkStatus::Expired(_)));
        assert_eq!(store.stats_for(code).unwrap().summary.record.clicks(), 1);
    }

    #[test]
    fn link_is_live_at_its_expiry_instant() {
        let (store, clock, _) = test_store();
        let req = ShortenRequest::builder()
            .original_url("https://example.com")
            .validity_minutes(1)
            .build();
        let code = store.shorten(req).unwrap().short_code().to_string();

        clock.advance(SignedDuration::from_secs(60));
        assert!(store.resolve(&code, ClickContext::default()).is_some());

        clock.advance(SignedDuration::from_nanos(1));
        assert!(store.resolve(&code, ClickContext::default()).is_none());
    }

    #[test]
    fn resolve_unknown_code() {
        let (store, _, _) = test_store();
        assert_eq!(store.resolve("nothing", ClickContext::default()), None);
        assert_eq!(store.get("nothing"), None);
        assert_eq!(store.status("nothing"), LinkStatus::NotFound);
    }

    #[test]
    fn each_resolve_adds_one_click() {
        let (store, clock, _) = test_store();
        store.shorten(custom("https://example.com", "promo")).unwrap();

        for expected in 1..=5u64 {
            clock.advance(SignedDuration::from_secs(10));
            let context = ClickContext::default()
                .with_referrer("https://news.example")
                .with_user_agent("curl/8.0");
            store.resolve("promo", context).unwrap();

            let record = store.get("promo").unwrap();
            assert_eq!(record.clicks(), expected);
            assert_eq!(record.click_history().len() as u64, record.clicks());
        }

        let record = store.get("promo").unwrap();
        let last = record.click_history().last().unwrap();
        assert_eq!(last.timestamp, start() + SignedDuration::from_secs(50));
        assert_eq!(last.referrer.as_deref(), Some("https://news.example"));
        assert_eq!(last.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn get_does_not_record_clicks() {
        let (store, _, _) = test_store();
        store.shorten(custom("https://example.com", "promo")).unwrap();
        store.get("promo");
        store.get("promo");
        assert_eq!(store.get("promo").unwrap().clicks(), 0);
    }

    #[test]
    fn list_all_includes_expired_links() {
        let (store, clock, _) = test_store();
        let short = ShortenRequest::builder()
            .original_url("https://example.com/short")
            .custom_code("brief".to_string())
            .validity_minutes(1)
            .build();
        store.shorten(short).unwrap();
        store
            .shorten(custom("https://example.com/long", "lasting"))
            .unwrap();

        clock.advance(SignedDuration::from_mins(2));
        let listed = store.list_all();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].record.short_code().as_str(), "brief");
        assert!(listed[0].is_expired);
        assert_eq!(listed[0].short_url, "https://snap.link/brief");
        assert!(!listed[1].is_expired);
    }

    #[test]
    fn stats_for_unknown_code_is_none() {
        let (store, _, _) = test_store();
        assert!(store.stats_for("nothing").is_none());
    }

    #[test]
    fn stats_aggregate_by_hour_and_day() {
        let (store, clock, _) = test_store();
        let req = ShortenRequest::builder()
            .original_url("https://example.com")
            .custom_code("promo".to_string())
            .validity_minutes(10_080)
            .build();
        store.shorten(req).unwrap();

        // 14:05, 14:35, 15:05 on Oct 17, then 14:05 on Oct 18.
        store.resolve("promo", ClickContext::default());
        clock.advance(SignedDuration::from_mins(30));
        store.resolve("promo", ClickContext::default());
        clock.advance(SignedDuration::from_mins(30));
        store.resolve("promo", ClickContext::default());
        clock.advance(SignedDuration::from_hours(23));
        store.resolve("promo", ClickContext::default());

        let stats = store.stats_for("promo").unwrap();
        assert_eq!(stats.summary.short_url, "https://snap.link/promo");
        assert!(!stats.summary.is_expired);
        assert_eq!(
            stats.clicks_by_hour,
            vec![
                HourlyClicks { hour: 14, clicks: 3 },
                HourlyClicks { hour: 15, clicks: 1 },
            ]
        );
        let hourly_total: u64 = stats.clicks_by_hour.iter().map(|h| h.clicks).sum();
        assert_eq!(hourly_total, stats.summary.record.clicks());

        let days: Vec<_> = stats
            .clicks_by_day
            .iter()
            .map(|d| (d.day.as_str(), d.clicks))
            .collect();
        assert_eq!(days, vec![("Sat Oct 17 2026", 3), ("Sun Oct 18 2026", 1)]);
    }

    #[test]
    fn reload_reproduces_table() {
        let (store, clock, kv) = test_store();
        let code = store
            .shorten(request("https://example.com"))
            .unwrap()
            .short_code()
            .to_string();
        store.shorten(custom("https://example.com/b", "promo")).unwrap();
        store.resolve(&code, ClickContext::default().with_referrer("direct"));
        store.resolve(&code, ClickContext::default());

        let reloaded = ShortLinkStore::new(kv, RandomGenerator::new(), clock, settings());

        assert_eq!(reloaded.list_all(), store.list_all());
        let record = reloaded.get(&code).unwrap();
        assert_eq!(record.clicks(), 2);
        assert_eq!(record.click_history().len(), 2);
    }

    #[test]
    fn save_failures_do_not_fail_operations() {
        let clock = ManualClock::new(start());
        let kv = InMemoryKvStore::with_quota(16);
        let store = ShortLinkStore::new(kv, RandomGenerator::new(), clock, settings());

        let record = store.shorten(custom("https://example.com", "promo")).unwrap();
        assert_eq!(record.short_code().as_str(), "promo");
        assert_eq!(
            store.resolve("promo", ClickContext::default()),
            Some("https://example.com".to_string())
        );
        assert_eq!(store.get("promo").unwrap().clicks(), 1);
    }

    #[test]
    fn collisions_widen_the_code() {
        let (store, _, _) = store_with(FixedGenerator);
        store
            .shorten(custom("https://example.com/taken", "aaaaaa"))
            .unwrap();

        let record = store.shorten(request("https://example.com")).unwrap();
        assert_eq!(record.short_code().as_str(), "aaaaaaa");
    }

    #[test]
    fn exhausted_code_space_fails() {
        let clock = ManualClock::new(start());
        let settings = StoreSettings::builder()
            .code_length(19)
            .max_attempts(3)
            .time_zone(TimeZone::UTC)
            .build();
        let store = ShortLinkStore::new(InMemoryKvStore::new(), FixedGenerator, clock, settings);
        store
            .shorten(custom("https://example.com", &"a".repeat(19)))
            .unwrap();
        store
            .shorten(custom("https://example.com", &"a".repeat(20)))
            .unwrap();

        assert_eq!(
            store.shorten(request("https://example.com")),
            Err(ShortenerError::CodeSpaceExhausted { max_length: 20 })
        );
    }

    #[test]
    fn seq_generator_skips_taken_codes() {
        let (store, _, _) = store_with(SeqGenerator::new());
        store
            .shorten(custom("https://example.com", "aaaaaa"))
            .unwrap();

        let record = store.shorten(request("https://example.com")).unwrap();
        assert_eq!(record.short_code().as_str(), "aaaaab");
    }

    #[test]
    fn concurrent_resolves_count_every_click() {
        let (store, _, _) = test_store();
        let store = Arc::new(store);
        store.shorten(custom("https://example.com", "promo")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.resolve("promo", ClickContext::default());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let record = store.get("promo").unwrap();
        assert_eq!(record.clicks(), 200);
        assert_eq!(record.click_history().len(), 200);
    }

    #[test]
    fn code_length_is_clamped_to_valid_lengths() {
        for (requested, expected) in [(0, "aaa".to_string()), (50, "a".repeat(20))] {
            let settings = StoreSettings::builder()
                .code_length(requested)
                .time_zone(TimeZone::UTC)
                .build();
            let store = ShortLinkStore::new(
                InMemoryKvStore::new(),
                SeqGenerator::new(),
                ManualClock::new(start()),
                settings,
            );
            assert_eq!(store.settings().code_length, expected.len());

            let record = store.shorten(request("https://example.com")).unwrap();
            assert_eq!(record.short_code().as_str(), expected);
        }
    }

    /// Ticks one second per call; the call numbered `slow_call` stalls after
    /// reading its time.
    struct StallingClock {
        calls: AtomicI64,
        slow_call: i64,
    }

    impl Clock for StallingClock {
        fn now(&self) -> Timestamp {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let now = start() + SignedDuration::from_secs(call);
            if call == self.slow_call {
                std::thread::sleep(Duration::from_millis(300));
            }
            now
        }
    }

    #[test]
    fn clicks_are_recorded_in_time_order_under_contention() {
        let clock = StallingClock {
            calls: AtomicI64::new(0),
            slow_call: 1,
        };
        let store = Arc::new(ShortLinkStore::new(
            InMemoryKvStore::new(),
            RandomGenerator::new(),
            clock,
            settings(),
        ));
        store.shorten(custom("https://example.com", "promo")).unwrap();

        let first = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.resolve("promo", ClickContext::default()))
        };
        std::thread::sleep(Duration::from_millis(50));
        let second = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.resolve("promo", ClickContext::default()))
        };
        assert!(first.join().unwrap().is_some());
        assert!(second.join().unwrap().is_some());

        let record = store.get("promo").unwrap();
        let times: Vec<_> = record.click_history().iter().map(|c| c.timestamp).collect();
        assert_eq!(times.len(), 2);
        assert!(times[0] < times[1], "{times:?}");
    }
}
