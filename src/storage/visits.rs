//! Visit tracking.
//!
//! Page-load telemetry kept as one flat JSON collection. Every operation
//! reads and rewrites the whole collection, so all of them go through a
//! single async mutex; concurrent requests queue instead of overwriting
//! each other's changes.

use std::cmp::Ordering;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::storage::json_file;

/// Which narrative pages a visitor has reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_feelings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thanks: Option<bool>,
    pub last_page: String,
}

/// One page-load event.
///
/// `id` is empty until the tracker assigns one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub page: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<Progression>,
}

impl VisitRecord {
    fn validate(&self) -> Result<()> {
        if self.page.trim().is_empty() {
            return Err(AppError::Validation("page is required".to_string()));
        }
        if self.timestamp.trim().is_empty() {
            return Err(AppError::Validation("timestamp is required".to_string()));
        }
        Ok(())
    }

    fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Newest first; records with unparseable timestamps sort last.
fn newest_first(a: &VisitRecord, b: &VisitRecord) -> Ordering {
    match (a.parsed_timestamp(), b.parsed_timestamp()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// File-backed visit collection.
#[derive(Debug)]
pub struct VisitTracker {
    path: PathBuf,
    lock: Mutex<()>,
}

impl VisitTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<VisitRecord>> {
        json_file::read_collection(&self.path).await
    }

    async fn store(&self, records: &[VisitRecord]) -> Result<()> {
        json_file::write_collection(&self.path, records).await
    }

    /// Appends a record, assigning an id if it has none.
    ///
    /// A caller-chosen id that is already taken is rejected.
    pub async fn record(&self, mut entry: VisitRecord) -> Result<VisitRecord> {
        entry.validate()?;
        if entry.id.trim().is_empty() {
            entry.id = new_id();
        }

        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        if records.iter().any(|r| r.id == entry.id) {
            return Err(AppError::Validation("Entry id already exists".to_string()));
        }
        records.push(entry.clone());
        self.store(&records).await?;

        debug!(id = %entry.id, page = %entry.page, "Visit recorded");
        Ok(entry)
    }

    /// All records, newest first.
    ///
    /// Legacy records without an id get one, and the assignment is written
    /// back so the id stays stable across listings.
    pub async fn list(&self) -> Result<Vec<VisitRecord>> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;

        let mut assigned = 0;
        for record in records.iter_mut().filter(|r| r.id.trim().is_empty()) {
            record.id = new_id();
            assigned += 1;
        }
        if assigned > 0 {
            self.store(&records).await?;
            info!(assigned, "Assigned ids to legacy visit records");
        }

        records.sort_by(newest_first);
        Ok(records)
    }

    /// Replaces the record with `id`. The stored record keeps that id.
    pub async fn update(&self, id: &str, mut entry: VisitRecord) -> Result<VisitRecord> {
        entry.validate()?;
        entry.id = id.to_string();

        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound("Entry not found".to_string()))?;
        *slot = entry.clone();
        self.store(&records).await?;

        debug!(id, "Visit updated");
        Ok(entry)
    }

    /// Removes the record with `id`.
    pub async fn delete_one(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(AppError::NotFound("Entry not found".to_string()));
        }
        self.store(&records).await?;

        debug!(id, "Visit deleted");
        Ok(())
    }

    /// Truncates the collection.
    pub async fn delete_all(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store(&[]).await?;
        info!("All visit records deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn visit(page: &str, timestamp: &str) -> VisitRecord {
        VisitRecord {
            page: page.to_string(),
            timestamp: timestamp.to_string(),
            ..Default::default()
        }
    }

    fn tracker(dir: &tempfile::TempDir) -> VisitTracker {
        VisitTracker::new(dir.path().join("tracking.json"))
    }

    #[tokio::test]
    async fn test_record_assigns_id() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);

        let saved = tracker
            .record(visit("landing", "2026-10-16T10:00:00Z"))
            .await
            .unwrap();

        assert!(!saved.id.is_empty());
        let listed = tracker.list().await.unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[tokio::test]
    async fn test_record_keeps_given_id() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);

        let mut entry = visit("landing", "2026-10-16T10:00:00Z");
        entry.id = "client-42".into();

        assert_eq!(tracker.record(entry).await.unwrap().id, "client-42");
    }

    #[tokio::test]
    async fn test_record_rejects_duplicate_id() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);

        let mut entry = visit("landing", "2026-10-16T10:00:00Z");
        entry.id = "client-42".into();
        tracker.record(entry.clone()).await.unwrap();

        entry.page = "thanks".into();
        let result = tracker.record(entry).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        let listed = tracker.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].page, "landing");
    }

    #[tokio::test]
    async fn test_record_requires_page() {
        let dir = tempfile::tempdir().unwrap();
        let result = tracker(&dir).record(visit("  ", "2026-10-16T10:00:00Z")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);

        tracker.record(visit("a", "2026-10-16T10:00:00Z")).await.unwrap();
        tracker.record(visit("b", "2026-10-16T12:00:00+05:30")).await.unwrap();
        tracker.record(visit("c", "2026-10-16T11:00:00Z")).await.unwrap();
        tracker.record(visit("d", "not a date")).await.unwrap();

        let pages: Vec<String> = tracker
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.page)
            .collect();
        // 12:00+05:30 is 06:30Z, the oldest parseable one
        assert_eq!(pages, vec!["c", "a", "b", "d"]);
    }

    #[tokio::test]
    async fn test_list_assigns_stable_ids_to_legacy_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracking.json");
        tokio::fs::write(
            &path,
            r#"[{"page":"landing","timestamp":"2026-10-16T10:00:00Z"}]"#,
        )
        .await
        .unwrap();
        let tracker = VisitTracker::new(&path);

        let first = tracker.list().await.unwrap();
        let second = tracker.list().await.unwrap();

        assert!(!first[0].id.is_empty());
        assert_eq!(first[0].id, second[0].id);
    }

    #[tokio::test]
    async fn test_update_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        let saved = tracker
            .record(visit("landing", "2026-10-16T10:00:00Z"))
            .await
            .unwrap();

        let mut changed = visit("thanks", "2026-10-16T10:05:00Z");
        changed.progression = Some(Progression {
            thanks: Some(true),
            last_page: "thanks".into(),
            ..Default::default()
        });
        let updated = tracker.update(&saved.id, changed).await.unwrap();

        assert_eq!(updated.id, saved.id);
        let listed = tracker.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].page, "thanks");
    }

    #[tokio::test]
    async fn test_update_unknown_id_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        tracker.record(visit("landing", "2026-10-16T10:00:00Z")).await.unwrap();
        let before = tracker.list().await.unwrap();

        let result = tracker
            .update("missing", visit("x", "2026-10-16T11:00:00Z"))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(tracker.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_one() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        let a = tracker.record(visit("a", "2026-10-16T10:00:00Z")).await.unwrap();
        let b = tracker.record(visit("b", "2026-10-16T11:00:00Z")).await.unwrap();

        tracker.delete_one(&a.id).await.unwrap();

        assert_eq!(tracker.list().await.unwrap(), vec![b]);
        assert!(matches!(
            tracker.delete_one(&a.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_all_then_list_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        tracker.record(visit("a", "2026-10-16T10:00:00Z")).await.unwrap();
        tracker.record(visit("b", "2026-10-16T11:00:00Z")).await.unwrap();

        tracker.delete_all().await.unwrap();

        assert!(tracker.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_records_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(tracker(&dir));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    tracker
                        .record(visit(&format!("page-{}", i), "2026-10-16T10:00:00Z"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(tracker.list().await.unwrap().len(), 20);
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "sessionId": "s1",
            "page": "questions",
            "timestamp": "2026-10-16T10:00:00Z",
            "progression": {"myFeelings": true, "lastPage": "questions"}
        }"#;
        let record: VisitRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "");
        assert_eq!(record.session_id.as_deref(), Some("s1"));
        assert_eq!(record.progression.unwrap().my_feelings, Some(true));
    }
}
