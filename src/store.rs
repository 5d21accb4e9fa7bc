use crate::errors::StoreError;
use crate::models::{Entry, EntryField};
use crate::remote::{Action, RemoteStore};
use crate::timezone::{ZoneDeriver, LOCAL_FORMAT};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// In-memory entry list kept in sync with the remote store.
///
/// Every mutation goes through the remote first and only lands in the list
/// once the remote has accepted it. Callers serialize access (the app keeps
/// the store behind a mutex), so at most one remote write is in flight.
pub struct EntryStore {
    remote: Arc<dyn RemoteStore>,
    deriver: ZoneDeriver,
    entries: Vec<Entry>,
    next_id: i64,
}

impl EntryStore {
    pub fn new(remote: Arc<dyn RemoteStore>, deriver: ZoneDeriver) -> Self {
        Self {
            remote,
            deriver,
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn deriver(&self) -> &ZoneDeriver {
        &self.deriver
    }

    pub async fn load(&mut self) -> usize {
        self.load_at(Utc::now()).await
    }

    /// Replaces the list with the remote contents. Never fails: when the
    /// remote cannot be read the list falls back to one default entry.
    pub async fn load_at(&mut self, now: DateTime<Utc>) -> usize {
        match self.remote.fetch_all().await {
            Ok(records) => {
                let mut entries = Vec::with_capacity(records.len());
                for record in &records {
                    match Entry::from_remote(record) {
                        Ok(mut entry) => {
                            self.refresh_derived(&mut entry);
                            entries.push(entry);
                        }
                        Err(err) => warn!("skipping remote record: {err}"),
                    }
                }

                self.next_id = entries.iter().map(|entry| entry.id).max().map_or(1, |max| max + 1);
                self.entries = entries;

                if self.entries.is_empty() {
                    info!("remote store is empty, creating a default entry");
                    if let Err(err) = self.add_at(now).await {
                        warn!("failed to create default entry remotely: {err}");
                        self.push_local_default(now);
                    }
                }
            }
            Err(err) => {
                error!("failed to load entries: {err}");
                self.entries.clear();
                self.next_id = 1;
                self.push_local_default(now);
            }
        }

        info!(count = self.entries.len(), "entries loaded");
        self.entries.len()
    }

    pub async fn add(&mut self) -> Result<Entry, StoreError> {
        self.add_at(Utc::now()).await
    }

    pub async fn add_at(&mut self, now: DateTime<Utc>) -> Result<Entry, StoreError> {
        let mut entry = self.default_entry(now);
        let echoed = self.remote.submit(Action::Add, &entry).await?;

        if let Some(confirmed) = echoed.and_then(|record| Entry::from_remote(&record).ok()) {
            entry.id = confirmed.id;
        }
        self.next_id = self.next_id.max(entry.id) + 1;
        self.entries.push(entry.clone());

        info!(id = entry.id, "entry added");
        Ok(entry)
    }

    /// Edits one field and persists the whole entry.
    ///
    /// Returns `Ok(None)` without contacting the remote when `id` is unknown.
    pub async fn update(
        &mut self,
        id: i64,
        field: EntryField,
        value: &str,
    ) -> Result<Option<Entry>, StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let mut entry = self.entries[index].clone();
        match field {
            EntryField::LocalDateTime => {
                let derived = self.deriver.derive(value)?;
                entry.local_date_time = value.trim().to_string();
                entry.apply_derived(derived);
            }
            EntryField::RequestsSent => entry.requests_sent = field.parse_counter(value)?,
            EntryField::Accepted => entry.accepted = field.parse_counter(value)?,
            EntryField::Rejected => entry.rejected = field.parse_counter(value)?,
        }
        if field.is_counter() {
            entry.recompute_counts();
        }

        self.remote.submit(Action::Update, &entry).await?;
        self.entries[index] = entry.clone();

        info!(id, ?field, "entry updated");
        Ok(Some(entry))
    }

    /// Returns `Ok(false)` without contacting the remote when `id` is unknown.
    pub async fn delete(&mut self, id: i64) -> Result<bool, StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        self.remote.submit(Action::Delete, &self.entries[index]).await?;
        self.entries.remove(index);

        info!(id, "entry deleted");
        Ok(true)
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn default_entry(&self, now: DateTime<Utc>) -> Entry {
        let local = now
            .with_timezone(&self.deriver.source_offset())
            .naive_local()
            .format(LOCAL_FORMAT)
            .to_string();
        let mut entry = Entry::new(self.next_id, local);
        self.refresh_derived(&mut entry);
        entry
    }

    fn push_local_default(&mut self, now: DateTime<Utc>) {
        let entry = self.default_entry(now);
        self.next_id = entry.id + 1;
        self.entries.push(entry);
    }

    fn refresh_derived(&self, entry: &mut Entry) {
        match self.deriver.derive(&entry.local_date_time) {
            Ok(derived) => entry.apply_derived(derived),
            Err(err) => {
                warn!(id = entry.id, "keeping entry without zone times: {err}");
                entry.weekday.clear();
                entry.zone_times.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::TargetZone;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRemote {
        records: Mutex<Vec<Value>>,
        submits: Mutex<Vec<(Action, i64)>>,
        fetches: AtomicUsize,
        failing: AtomicBool,
        assign_id: Mutex<Option<i64>>,
    }

    impl FakeRemote {
        fn with_records(records: Vec<Value>) -> Arc<Self> {
            let remote = Self::default();
            *remote.records.lock().unwrap() = records;
            Arc::new(remote)
        }

        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn submit_count(&self) -> usize {
            self.submits.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RemoteStore for FakeRemote {
        async fn fetch_all(&self) -> Result<Vec<Value>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::RemoteUnavailable("connection refused".into()));
            }
            Ok(self.records.lock().unwrap().clone())
        }

        async fn submit(&self, action: Action, entry: &Entry) -> Result<Option<Value>, StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::RemoteRejected("sheet locked".into()));
            }
            self.submits.lock().unwrap().push((action, entry.id));
            let id = self.assign_id.lock().unwrap().unwrap_or(entry.id);
            Ok(Some(json!({ "id": id })))
        }
    }

    fn deriver() -> ZoneDeriver {
        let targets = vec![TargetZone::parse("EST=America/New_York").unwrap()];
        ZoneDeriver::new(FixedOffset::east_opt(330 * 60).unwrap(), targets)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 15, 0, 0).unwrap()
    }

    async fn loaded_store(remote: Arc<FakeRemote>) -> EntryStore {
        let mut store = EntryStore::new(remote, deriver());
        store.load_at(now()).await;
        store
    }

    fn sample_records() -> Vec<Value> {
        vec![
            json!({ "id": 3, "localDateTime": "2025-10-01T20:30", "requestsSent": "10", "accepted": "4", "rejected": 1 }),
            json!({ "id": "8", "localDateTime": "", "requestsSent": 2 }),
        ]
    }

    #[tokio::test]
    async fn load_parses_records_and_derives_fields() {
        let remote = FakeRemote::with_records(sample_records());
        let store = loaded_store(remote.clone()).await;

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, 3);
        assert_eq!(entries[0].pending, 5);
        assert_eq!(entries[0].weekday, "Wednesday");
        assert_eq!(entries[0].zone_times["EST"], "11:00 AM EDT");
        assert_eq!(entries[1].id, 8);
        assert!(entries[1].zone_times.is_empty());
        assert_eq!(remote.submit_count(), 0);
    }

    #[tokio::test]
    async fn load_skips_records_without_id() {
        let remote = FakeRemote::with_records(vec![
            json!({ "requestsSent": 4 }),
            json!({ "id": 2, "requestsSent": 4 }),
        ]);
        let store = loaded_store(remote).await;
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.entries()[0].id, 2);
    }

    #[tokio::test]
    async fn load_failure_falls_back_to_one_default_entry() {
        let remote = FakeRemote::with_records(sample_records());
        remote.fail(true);
        let store = loaded_store(remote.clone()).await;

        assert_eq!(store.entries().len(), 1);
        let entry = &store.entries()[0];
        assert_eq!(entry.requests_sent, 0);
        assert_eq!(entry.accepted, 0);
        assert_eq!(entry.rejected, 0);
        assert_eq!(entry.pending, 0);
        assert_eq!(entry.local_date_time, "2025-10-01T20:30");
        assert_eq!(remote.submit_count(), 0);
    }

    #[tokio::test]
    async fn load_empty_remote_creates_default_entry() {
        let remote = FakeRemote::with_records(Vec::new());
        let store = loaded_store(remote.clone()).await;

        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.entries()[0].weekday, "Wednesday");
        assert_eq!(remote.submits.lock().unwrap()[0], (Action::Add, 1));
    }

    #[tokio::test]
    async fn add_adopts_remote_id() {
        let remote = FakeRemote::with_records(sample_records());
        let mut store = loaded_store(remote.clone()).await;
        *remote.assign_id.lock().unwrap() = Some(42);

        let entry = store.add_at(now()).await.unwrap();
        assert_eq!(entry.id, 42);
        assert_eq!(store.entries().last().unwrap().id, 42);
        assert_eq!(remote.submits.lock().unwrap()[0], (Action::Add, 9));

        *remote.assign_id.lock().unwrap() = None;
        let next = store.add_at(now()).await.unwrap();
        assert_eq!(next.id, 43);
    }

    #[tokio::test]
    async fn add_failure_leaves_list_unchanged() {
        let remote = FakeRemote::with_records(sample_records());
        let mut store = loaded_store(remote.clone()).await;
        remote.fail(true);

        let err = store.add_at(now()).await.unwrap_err();
        assert!(matches!(err, StoreError::RemoteRejected(_)));
        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn update_counters_recompute_pending_and_rate() {
        let remote = FakeRemote::with_records(sample_records());
        let mut store = loaded_store(remote.clone()).await;
        assert_eq!(store.entries()[0].acceptance_rate, 40.0);

        let entry = store.update(3, EntryField::Accepted, "7").await.unwrap().unwrap();
        assert_eq!(entry.pending, 2);
        assert_eq!(entry.acceptance_rate, 70.0);

        let entry = store.update(3, EntryField::Rejected, "6").await.unwrap().unwrap();
        assert_eq!(entry.pending, -3);
        assert_eq!(store.entries()[0].pending, -3);
        assert_eq!(remote.submit_count(), 2);
    }

    #[tokio::test]
    async fn update_timestamp_rederives_zone_times() {
        let remote = FakeRemote::with_records(sample_records());
        let mut store = loaded_store(remote).await;

        let entry = store
            .update(8, EntryField::LocalDateTime, "2025-01-14T21:00")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.weekday, "Tuesday");
        assert_eq!(entry.zone_times["EST"], "10:30 AM EST");
        assert_eq!(entry.requests_sent, 2);
    }

    #[tokio::test]
    async fn update_unknown_id_is_noop() {
        let remote = FakeRemote::with_records(sample_records());
        let mut store = loaded_store(remote.clone()).await;
        let before = store.entries().to_vec();

        let result = store.update(99, EntryField::Accepted, "1").await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.entries(), before.as_slice());
        assert_eq!(remote.submit_count(), 0);
    }

    #[tokio::test]
    async fn update_rejects_invalid_values_before_contacting_remote() {
        let remote = FakeRemote::with_records(sample_records());
        let mut store = loaded_store(remote.clone()).await;

        let err = store.update(3, EntryField::RequestsSent, "ten").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        let err = store.update(3, EntryField::Accepted, "-1").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        let err = store
            .update(3, EntryField::RequestsSent, "9223372036854775808")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        let err = store
            .update(3, EntryField::LocalDateTime, "tomorrow")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));

        assert_eq!(store.entries()[0].requests_sent, 10);
        assert_eq!(remote.submit_count(), 0);
    }

    #[tokio::test]
    async fn update_remote_failure_keeps_previous_entry() {
        let remote = FakeRemote::with_records(sample_records());
        let mut store = loaded_store(remote.clone()).await;
        remote.fail(true);

        assert!(store.update(3, EntryField::Accepted, "9").await.is_err());
        assert_eq!(store.entries()[0].accepted, 4);
        assert_eq!(store.entries()[0].pending, 5);
    }

    #[tokio::test]
    async fn delete_removes_entry_after_confirmation() {
        let remote = FakeRemote::with_records(sample_records());
        let mut store = loaded_store(remote.clone()).await;

        remote.fail(true);
        assert!(store.delete(3).await.is_err());
        assert_eq!(store.entries().len(), 2);

        remote.fail(false);
        assert!(store.delete(3).await.unwrap());
        assert_eq!(store.entries().len(), 1);
        assert_eq!(remote.submits.lock().unwrap()[0], (Action::Delete, 3));

        assert!(!store.delete(3).await.unwrap());
        assert_eq!(remote.submit_count(), 1);
    }
}
