/// Archive synchronizer: persisted archive/restore and reconciliation of
/// rows against the stored record set.
///
/// Nothing in here touches the DOM. The page layer hands in row identities
/// and receives a [`ReconcilePlan`] describing which rows to hide.
use crate::error::ArchiveError;
use crate::identity::RowIdentity;
use crate::storage::{ArchiveRecordSet, ArchiveStore};
use futures_util::lock::Mutex;
use std::collections::BTreeSet;

/// Rows to hide for a given record set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Row positions, ascending, each listed once
    pub hidden: BTreeSet<usize>,
    /// Records that matched no row on this page
    pub stale: usize,
}

impl ReconcilePlan {
    pub fn is_hidden(&self, row: usize) -> bool {
        self.hidden.contains(&row)
    }
}

/// For each record, pick the first row whose identity matches it.
///
/// `rows` holds the identity of every current row in table order, `None`
/// for rows whose identity could not be read.
pub fn plan_reconciliation(rows: &[Option<RowIdentity>], records: &ArchiveRecordSet) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for record in records.iter() {
        let first_match = rows
            .iter()
            .position(|row| row.as_ref().is_some_and(|identity| identity.matches(record)));

        match first_match {
            Some(index) => {
                plan.hidden.insert(index);
            }
            None => plan.stale += 1,
        }
    }

    plan
}

/// A change to the archive record set requested from the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    Archive(RowIdentity),
    Restore(RowIdentity),
}

pub struct ArchiveSynchronizer<S> {
    store: S,
    key: String,
    dedupe_on_write: bool,
    // Held across each read-modify-write, and across plain reads, so a read
    // never returns a set older than a write that started before it.
    write_lock: Mutex<()>,
}

impl<S: ArchiveStore> ArchiveSynchronizer<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        ArchiveSynchronizer {
            store,
            key: key.into(),
            dedupe_on_write: true,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_dedupe(mut self, dedupe_on_write: bool) -> Self {
        self.dedupe_on_write = dedupe_on_write;
        self
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Current record set, empty when nothing was stored yet
    pub async fn load(&self) -> Result<ArchiveRecordSet, ArchiveError> {
        let _guard = self.write_lock.lock().await;
        self.read().await
    }

    /// Append `identity` and return the committed set.
    ///
    /// With deduplication on, an identity already present is not appended
    /// again and nothing is written.
    pub async fn archive(&self, identity: RowIdentity) -> Result<ArchiveRecordSet, ArchiveError> {
        let _guard = self.write_lock.lock().await;
        self.append(identity).await
    }

    /// Drop every record matching `identity` and return the committed set
    /// together with the number of records removed.
    pub async fn restore(&self, identity: &RowIdentity) -> Result<(ArchiveRecordSet, usize), ArchiveError> {
        let _guard = self.write_lock.lock().await;
        self.remove(identity).await
    }

    /// Persist `change`, then hand the committed set to `on_committed`.
    ///
    /// `on_committed` runs only once the store accepted the write, and before
    /// any other read or write of this synchronizer proceeds. On error it is
    /// not called at all.
    pub async fn commit<F>(&self, change: RecordChange, on_committed: F) -> Result<(), ArchiveError>
    where
        F: FnOnce(&ArchiveRecordSet),
    {
        let _guard = self.write_lock.lock().await;
        let records = match change {
            RecordChange::Archive(identity) => self.append(identity).await?,
            RecordChange::Restore(identity) => self.remove(&identity).await?.0,
        };
        on_committed(&records);
        Ok(())
    }

    /// Load the stored set and plan which of `rows` to hide
    pub async fn reconcile(&self, rows: &[Option<RowIdentity>]) -> Result<ReconcilePlan, ArchiveError> {
        let records = self.load().await?;
        let plan = plan_reconciliation(rows, &records);
        if plan.stale > 0 {
            log::debug!("{} archived records are not on this page", plan.stale);
        }
        Ok(plan)
    }

    // Callers below hold `write_lock`

    async fn read(&self) -> Result<ArchiveRecordSet, ArchiveError> {
        Ok(self.store.get(&self.key).await?.unwrap_or_default())
    }

    async fn append(&self, identity: RowIdentity) -> Result<ArchiveRecordSet, ArchiveError> {
        let mut records = self.read().await?;
        if self.dedupe_on_write && records.contains_match(&identity) {
            log::debug!("{:?} is already archived", identity);
            return Ok(records);
        }

        records.push(identity);
        self.store.set(&self.key, &records).await?;
        log::info!("Archived ticket row ({} records stored)", records.len());
        Ok(records)
    }

    async fn remove(&self, identity: &RowIdentity) -> Result<(ArchiveRecordSet, usize), ArchiveError> {
        let mut records = self.read().await?;
        let removed = records.remove_matching(identity);
        if removed == 0 {
            log::debug!("{:?} was not archived", identity);
            return Ok((records, 0));
        }

        self.store.set(&self.key, &records).await?;
        log::info!("Restored ticket row ({} records removed)", removed);
        Ok((records, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnIndexMap;
    use crate::config::IdentityScheme;
    use crate::identity::extract_identity;
    use crate::storage::memory::MemoryStore;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    const KEY: &str = "archivedTickets";

    /// Minimal stand-in for the page: rows of cell text plus a hidden flag
    struct FakeTable {
        columns: ColumnIndexMap,
        rows: Vec<Vec<String>>,
        hidden: Vec<bool>,
    }

    impl FakeTable {
        fn new(rows: &[(&str, &str)]) -> Self {
            FakeTable {
                columns: ColumnIndexMap::locate([Some("1"), None, Some("10")]),
                rows: rows
                    .iter()
                    .map(|(id, ts)| vec![id.to_string(), "Subject".to_string(), ts.to_string()])
                    .collect(),
                hidden: vec![false; rows.len()],
            }
        }

        fn identity(&self, row: usize) -> RowIdentity {
            extract_identity(&self.rows[row], &self.columns, IdentityScheme::Composite).unwrap()
        }

        fn identities(&self) -> Vec<Option<RowIdentity>> {
            self.rows
                .iter()
                .map(|row| extract_identity(row, &self.columns, IdentityScheme::Composite).ok())
                .collect()
        }

        fn apply(&mut self, plan: &ReconcilePlan) {
            for (index, hidden) in self.hidden.iter_mut().enumerate() {
                *hidden = plan.is_hidden(index);
            }
        }

        async fn reconcile(&mut self, sync: &ArchiveSynchronizer<MemoryStore>) {
            let plan = sync.reconcile(&self.identities()).await.unwrap();
            self.apply(&plan);
        }
    }

    fn synchronizer() -> ArchiveSynchronizer<MemoryStore> {
        ArchiveSynchronizer::new(MemoryStore::new(), KEY)
    }

    #[tokio::test]
    async fn test_archive_single_row_scenario() {
        let sync = synchronizer();
        let mut table = FakeTable::new(&[("55", "10/05/24 14:30")]);

        let records = sync.archive(table.identity(0)).await.unwrap();
        let plan = plan_reconciliation(&table.identities(), &records);
        table.apply(&plan);

        assert_eq!(sync.store().raw(KEY), Some(json!([["55", "10/05/24 14:30"]])));
        assert_eq!(table.hidden, vec![true]);

        // Reload: same table, same stored set
        let mut reloaded = FakeTable::new(&[("55", "10/05/24 14:30")]);
        reloaded.reconcile(&sync).await;

        assert_eq!(reloaded.hidden, vec![true]);
        assert_eq!(sync.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_archive_then_restore_round_trip() {
        let sync = synchronizer();
        let mut table = FakeTable::new(&[("1", "10/05/24 14:30"), ("2", "11/05/24 08:00")]);

        sync.archive(table.identity(1)).await.unwrap();
        table.reconcile(&sync).await;
        assert_eq!(table.hidden, vec![false, true]);

        let (records, removed) = sync.restore(&table.identity(1)).await.unwrap();
        table.apply(&plan_reconciliation(&table.identities(), &records));

        assert_eq!(removed, 1);
        assert!(records.is_empty());
        assert_eq!(table.hidden, vec![false, false]);
        assert_eq!(sync.store().raw(KEY), Some(json!([])));
    }

    #[tokio::test]
    async fn test_restore_leaves_other_timestamp_archived() {
        let sync = synchronizer();
        let mut table = FakeTable::new(&[("100", "2024-01-01T10:00:00Z"), ("100", "2024-01-02T10:00:00Z")]);

        sync.archive(table.identity(0)).await.unwrap();
        sync.archive(table.identity(1)).await.unwrap();
        table.reconcile(&sync).await;
        assert_eq!(table.hidden, vec![true, true]);

        sync.restore(&table.identity(0)).await.unwrap();
        table.reconcile(&sync).await;

        assert_eq!(table.hidden, vec![false, true]);
        let records = sync.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.contains_match(&RowIdentity::composite("100", "2024-01-02T10:00:00Z")));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let sync = synchronizer();
        let mut table = FakeTable::new(&[("1", "a"), ("2", "b"), ("3", "c")]);
        sync.archive(table.identity(0)).await.unwrap();
        sync.archive(table.identity(2)).await.unwrap();

        table.reconcile(&sync).await;
        let first = table.hidden.clone();
        table.reconcile(&sync).await;

        assert_eq!(first, vec![true, false, true]);
        assert_eq!(table.hidden, first);
        assert_eq!(sync.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_record_hides_nothing() {
        let sync = synchronizer();
        sync.archive(RowIdentity::composite("999", "01/01/24 00:00")).await.unwrap();

        let mut table = FakeTable::new(&[("1", "10/05/24 14:30")]);
        let plan = sync.reconcile(&table.identities()).await.unwrap();
        table.apply(&plan);

        assert_eq!(plan.stale, 1);
        assert!(plan.hidden.is_empty());
        assert_eq!(table.hidden, vec![false]);
    }

    #[tokio::test]
    async fn test_dedupe_on_write() {
        let sync = synchronizer();
        let identity = RowIdentity::composite("55", "10/05/24 14:30");

        sync.archive(identity.clone()).await.unwrap();
        let records = sync.archive(identity).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(sync.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_heal_on_restore() {
        let sync = synchronizer().with_dedupe(false);
        let identity = RowIdentity::composite("55", "10/05/24 14:30");

        sync.archive(identity.clone()).await.unwrap();
        sync.archive(identity.clone()).await.unwrap();
        assert_eq!(sync.load().await.unwrap().len(), 2);

        let (records, removed) = sync.restore(&identity).await.unwrap();
        assert_eq!(removed, 2);
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_archives_are_serialized() {
        let sync = synchronizer();
        let identity = RowIdentity::composite("55", "10/05/24 14:30");

        let (a, b) = tokio::join!(sync.archive(identity.clone()), sync.archive(identity.clone()));
        a.unwrap();
        b.unwrap();

        assert_eq!(sync.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_changes_nothing() {
        let sync = synchronizer();
        let mut table = FakeTable::new(&[("1", "a"), ("2", "b")]);
        sync.archive(table.identity(0)).await.unwrap();
        table.reconcile(&sync).await;

        sync.store().set_fail_writes(true);
        let result = sync.archive(table.identity(1)).await;
        assert!(matches!(result, Err(ArchiveError::Store { .. })));

        let result = sync.restore(&table.identity(0)).await;
        assert!(matches!(result, Err(ArchiveError::Store { .. })));

        sync.store().set_fail_writes(false);
        table.reconcile(&sync).await;
        assert_eq!(table.hidden, vec![true, false]);
        assert_eq!(sync.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_read_aborts_archive() {
        let sync = synchronizer();
        sync.store().set_fail_reads(true);

        let result = sync.archive(RowIdentity::composite("1", "a")).await;
        assert!(result.is_err());
        assert_eq!(sync.store().raw(KEY), None);
    }

    #[tokio::test]
    async fn test_restore_unknown_identity_skips_write() {
        let sync = synchronizer();
        let (records, removed) = sync.restore(&RowIdentity::composite("1", "a")).await.unwrap();

        assert_eq!(removed, 0);
        assert!(records.is_empty());
        assert_eq!(sync.store().raw(KEY), None);
    }

    #[tokio::test]
    async fn test_commit_applies_after_write() {
        let sync = synchronizer();
        let identity = RowIdentity::composite("55", "10/05/24 14:30");
        let seen = Cell::new(None);

        sync.commit(RecordChange::Archive(identity.clone()), |records| {
            // The store already holds what the page is about to show
            assert_eq!(sync.store().raw(KEY), Some(json!([["55", "10/05/24 14:30"]])));
            seen.set(Some(records.len()));
        })
        .await
        .unwrap();
        assert_eq!(seen.get(), Some(1));

        sync.commit(RecordChange::Restore(identity), |records| {
            assert_eq!(sync.store().raw(KEY), Some(json!([])));
            seen.set(Some(records.len()));
        })
        .await
        .unwrap();
        assert_eq!(seen.get(), Some(0));
    }

    #[tokio::test]
    async fn test_commit_rejected_write_leaves_page_untouched() {
        let sync = synchronizer();
        let mut table = FakeTable::new(&[("1", "a"), ("2", "b")]);
        sync.archive(table.identity(0)).await.unwrap();
        table.reconcile(&sync).await;
        let before = sync.store().raw(KEY);

        sync.store().set_fail_writes(true);
        let archive = sync
            .commit(RecordChange::Archive(table.identity(1)), |records| {
                table.apply(&plan_reconciliation(&table.identities(), records))
            })
            .await;
        assert!(matches!(archive, Err(ArchiveError::Store { .. })));

        let restore = sync
            .commit(RecordChange::Restore(table.identity(0)), |records| {
                table.apply(&plan_reconciliation(&table.identities(), records))
            })
            .await;
        assert!(matches!(restore, Err(ArchiveError::Store { .. })));

        assert_eq!(table.hidden, vec![true, false]);
        assert_eq!(sync.store().raw(KEY), before);
    }

    #[tokio::test]
    async fn test_slow_load_cannot_overwrite_newer_commit() {
        let sync = synchronizer();
        // The refresh read stays pending for a few turns, the commit read does not
        sync.store().delay_reads(&[3, 0]);
        let applied = RefCell::new(Vec::new());

        let refresh = async {
            let records = sync.load().await.unwrap();
            applied.borrow_mut().push(records.len());
        };
        let click = sync.commit(RecordChange::Archive(RowIdentity::composite("1", "a")), |records| {
            applied.borrow_mut().push(records.len())
        });
        let (_, committed) = tokio::join!(refresh, click);
        committed.unwrap();

        // Whatever the page shows last reflects the committed archive
        assert_eq!(applied.into_inner(), vec![0, 1]);
    }

    #[test]
    fn test_plan_ignores_unreadable_rows() {
        let rows = vec![None, Some(RowIdentity::composite("1", "a")), Some(RowIdentity::composite("1", "a"))];
        let records: ArchiveRecordSet = vec![RowIdentity::composite("1", "a")].into_iter().collect();

        let plan = plan_reconciliation(&rows, &records);

        // Only the first matching row is hidden
        assert_eq!(plan.hidden.into_iter().collect::<Vec<_>>(), vec![1]);
        assert_eq!(plan.stale, 0);
    }
}
