use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};
use snaplink_core::{ClickContext, LinkStatus, ManualClock, ShortenRequest, Shortener};
use snaplink_generator::RandomGenerator;
use snaplink_shortener::table::TABLE_KEY;
use snaplink_shortener::{ShortLinkStore, StoreSettings};
use snaplink_storage::{FileKvStore, KeyValueStore};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    kv: FileKvStore,
    clock: ManualClock,
}

impl Fixture {
    fn start() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let kv = FileKvStore::new(dir.path().join("data"));
        let start: Timestamp = "2026-10-17T08:00:00Z".parse().expect("parse start time");
        Self {
            _dir: dir,
            kv,
            clock: ManualClock::new(start),
        }
    }

    /// Opens a fresh store over the same directory, as a new process would.
    fn open(&self) -> ShortLinkStore<FileKvStore, RandomGenerator, ManualClock> {
        let settings = StoreSettings::builder()
            .base_url("https://snap.link")
            .time_zone(TimeZone::UTC)
            .build();
        ShortLinkStore::new(
            self.kv.clone(),
            RandomGenerator::new(),
            self.clock.clone(),
            settings,
        )
    }
}

#[test]
fn links_and_clicks_survive_restart() {
    let fixture = Fixture::start();

    let code = {
        let store = fixture.open();
        let record = store
            .shorten(
                ShortenRequest::builder()
                    .original_url("https://example.com/a")
                    .validity_minutes(1)
                    .build(),
            )
            .unwrap();
        let code = record.short_code().to_string();
        assert_eq!(
            store.resolve(&code, ClickContext::default().with_referrer("direct")),
            Some("https://example.com/a".to_string())
        );
        code
    };

    let store = fixture.open();
    let record = store.get(&code).expect("record reloaded");
    assert_eq!(record.clicks(), 1);
    assert_eq!(record.click_history().len(), 1);
    assert_eq!(
        record.click_history()[0].referrer.as_deref(),
        Some("direct")
    );

    fixture.clock.advance(SignedDuration::from_secs(61));
    assert_eq!(store.resolve(&code, ClickContext::default()), None);
    assert!(matches!(store.status(&code), LinkStatus::Expired(_)));

    let summary = &store.list_all()[0];
    assert!(summary.is_expired);
    assert_eq!(summary.short_url, format!("https://snap.link/{code}"));
}

#[test]
fn custom_codes_stay_taken_across_restarts() {
    let fixture = Fixture::start();
    let request = ShortenRequest::builder()
        .original_url("https://example.com")
        .custom_code("promo".to_string())
        .build();

    fixture.open().shorten(request.clone()).unwrap();

    assert!(fixture.open().shorten(request).is_err());
}

#[test]
fn persisted_blob_uses_the_table_key() {
    let fixture = Fixture::start();
    let store = fixture.open();
    store
        .shorten(
            ShortenRequest::builder()
                .original_url("https://example.com")
                .custom_code("promo".to_string())
                .build(),
        )
        .unwrap();

    let stored = fixture.kv.get(TABLE_KEY).unwrap().expect("table written");
    let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(value["promo"]["originalUrl"], "https://example.com");
    assert_eq!(value["promo"]["codeOrigin"], "custom");
    assert_eq!(value["promo"]["validityMinutes"], 30);
    assert_eq!(value["promo"]["createdAt"], "2026-10-17T08:00:00Z");
    assert_eq!(value["promo"]["expiryTime"], "2026-10-17T08:30:00Z");
}

#[test]
fn corrupt_data_file_starts_empty_and_is_overwritten() {
    let fixture = Fixture::start();
    fixture.kv.set(TABLE_KEY, "definitely not json").unwrap();

    let store = fixture.open();
    assert!(store.list_all().is_empty());

    store
        .shorten(
            ShortenRequest::builder()
                .original_url("https://example.com")
                .build(),
        )
        .unwrap();
    assert_eq!(fixture.open().list_all().len(), 1);
}
