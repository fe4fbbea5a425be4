use crate::jobs::store::PostingStore;
use crate::jobs::types::JobPosting;
use crate::telemetry::{self};

use super::error::ScrapeError;
use super::types::ReconcileReport;

/// Upsert each posting by dedup key, one at a time, in input order.
///
/// No batch transaction: on a store failure the remaining postings are skipped and
/// everything written before stays committed. The error carries that count.
pub async fn reconcile<S>(store: &S, postings: &[JobPosting]) -> Result<ReconcileReport, ScrapeError>
where
    S: PostingStore + ?Sized,
{
    let log = telemetry::scrape();
    let mut report = ReconcileReport::default();

    for posting in postings {
        let key = posting.key();
        let write_failed = |source: sqlx::Error| ScrapeError::StoreWriteFailure {
            processed: report.count,
            key: key.clone(),
            source,
        };

        let existing = store.find_one(&key).await.map_err(write_failed)?;
        let inserted = store.upsert(posting).await.map_err(write_failed)?;

        // the store's answer wins if the row appeared between lookup and write
        if inserted {
            report.inserted += 1;
            log.debug_kv("➕ insert", [("key", key.to_string())]);
        } else if existing.as_ref() == Some(posting) {
            report.replaced += 1;
            report.unchanged += 1;
            log.debug_kv("= unchanged", [("key", key.to_string())]);
        } else {
            report.replaced += 1;
            log.debug_kv("♻️ replace", [("key", key.to_string())]);
        }
        report.count += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::store::memory::MemoryStore;
    use crate::jobs::types::JobType;
    use chrono::NaiveDate;

    fn posting(title: &str, location: &str) -> JobPosting {
        JobPosting {
            title: title.into(),
            company: "Acme".into(),
            location: location.into(),
            posting_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            job_type: JobType::FullTime,
            tags: vec!["Pricing".into()],
        }
    }

    #[tokio::test]
    async fn same_posting_twice_is_one_record() {
        let store = MemoryStore::default();
        let p = posting("Actuary", "London");
        let first = reconcile(&store, std::slice::from_ref(&p)).await.unwrap();
        let second = reconcile(&store, std::slice::from_ref(&p)).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(first, ReconcileReport { count: 1, inserted: 1, replaced: 0, unchanged: 0 });
        assert_eq!(second, ReconcileReport { count: 1, inserted: 0, replaced: 1, unchanged: 1 });
    }

    #[tokio::test]
    async fn second_sighting_replaces_non_key_fields() {
        let store = MemoryStore::default();
        let mut updated = posting("Actuary", "Paris");
        updated.job_type = JobType::Contract;
        updated.tags = vec!["Life".into()];

        let report = reconcile(&store, &[posting("Actuary", "London"), updated.clone()]).await.unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.replaced, 1);
        assert_eq!(report.unchanged, 0);
        assert_eq!(store.len(), 1);

        let stored = store.get(&updated.key()).unwrap();
        assert_eq!(stored.location, "Paris");
        assert_eq!(stored.job_type, JobType::Contract);
        // full replacement, not a union of old and new tags
        assert_eq!(stored.tags, vec!["Life"]);
    }

    #[tokio::test]
    async fn different_dates_are_different_postings() {
        let store = MemoryStore::default();
        let mut later = posting("Actuary", "London");
        later.posting_date = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let report = reconcile(&store, &[posting("Actuary", "London"), later]).await.unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn store_failure_halts_batch_and_keeps_earlier_writes() {
        let store = MemoryStore::failing_after(2);
        let batch = vec![posting("A", "x"), posting("B", "x"), posting("C", "x"), posting("D", "x")];
        let err = reconcile(&store, &batch).await.unwrap_err();
        match &err {
            ScrapeError::StoreWriteFailure { processed, key, .. } => {
                assert_eq!(*processed, 2);
                assert_eq!(key.title, "C");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.processed(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(*store.writes.lock().unwrap(), vec![batch[0].key(), batch[1].key()]);
    }

    #[tokio::test]
    async fn insert_count_follows_the_store_not_the_lookup() {
        let store = MemoryStore { blind_reads: true, ..MemoryStore::default() };
        let p = posting("Actuary", "London");
        reconcile(&store, std::slice::from_ref(&p)).await.unwrap();
        let second = reconcile(&store, std::slice::from_ref(&p)).await.unwrap();
        assert_eq!(second, ReconcileReport { count: 1, inserted: 0, replaced: 1, unchanged: 0 });
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn empty_batch_is_zero() {
        let store = MemoryStore::default();
        assert_eq!(reconcile(&store, &[]).await.unwrap(), ReconcileReport::default());
    }
}
