//! Document store for the four entity collections.
//!
//! The whole dataset is one JSON document held behind an async mutex and
//! rewritten atomically (temp file + rename) after every mutation. An
//! in-memory mode (no path) backs the tests.
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    Child, ChildId, Lesson, LessonId, OperatorId, OperatorProfile, Payment, PaymentId,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Archived-flag filter for child listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchivedFilter {
    /// Only non-archived children (the default listing).
    Active,
    /// Only archived children.
    Archived,
    /// Both.
    Any,
}

impl ArchivedFilter {
    fn matches(self, archived: bool) -> bool {
        match self {
            ArchivedFilter::Active => !archived,
            ArchivedFilter::Archived => archived,
            ArchivedFilter::Any => true,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    children: HashMap<ChildId, Child>,
    #[serde(default)]
    lessons: HashMap<LessonId, Lesson>,
    #[serde(default)]
    payments: HashMap<PaymentId, Payment>,
    #[serde(default)]
    users: HashMap<OperatorId, OperatorProfile>,
}

#[derive(Clone, Debug)]
pub struct Store {
    path: Option<PathBuf>,
    inner: Arc<Mutex<Document>>,
}

impl Store {
    /// A store that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Arc::new(Mutex::new(Document::default())),
        }
    }

    /// Opens (or initializes) a file-backed store.
    ///
    /// A missing file starts empty; an unreadable or corrupt file is an
    /// error, never silently discarded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path: Some(path),
            inner: Arc::new(Mutex::new(document)),
        })
    }

    async fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> T {
        let guard = self.inner.lock().await;
        f(&guard)
    }

    async fn mutate<T>(&self, f: impl FnOnce(&mut Document) -> T) -> Result<T, StoreError> {
        let mut guard = self.inner.lock().await;
        let value = f(&mut guard);
        if let Some(path) = &self.path {
            write_json_file(path, &guard)?;
        }
        Ok(value)
    }

    // === Children ===

    pub async fn insert_child(&self, child: Child) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.children.insert(child.id, child);
        })
        .await
    }

    pub async fn child(&self, id: ChildId) -> Option<Child> {
        self.read(|doc| doc.children.get(&id).cloned()).await
    }

    /// Children owned by any of `owners`, oldest first.
    pub async fn children(&self, owners: &[OperatorId], filter: ArchivedFilter) -> Vec<Child> {
        self.read(|doc| {
            let mut out: Vec<Child> = doc
                .children
                .values()
                .filter(|c| owners.contains(&c.operator) && filter.matches(c.archived))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            out
        })
        .await
    }

    /// Applies `f` to the stored child, bumping `updated_at`.
    ///
    /// Returns the updated record, or `None` when the id is unknown (in
    /// which case nothing is written).
    pub async fn update_child(
        &self,
        id: ChildId,
        f: impl FnOnce(&mut Child),
    ) -> Result<Option<Child>, StoreError> {
        self.mutate(|doc| {
            doc.children.get_mut(&id).map(|child| {
                f(child);
                child.updated_at = chrono::Utc::now();
                child.clone()
            })
        })
        .await
    }

    pub async fn delete_child(&self, id: ChildId) -> Result<bool, StoreError> {
        self.mutate(|doc| doc.children.remove(&id).is_some()).await
    }

    /// Usage counters gating hard deletion.
    pub async fn count_lessons_for(&self, child_id: ChildId) -> u64 {
        self.read(|doc| {
            doc.lessons
                .values()
                .filter(|l| l.child_id == child_id)
                .count() as u64
        })
        .await
    }

    pub async fn count_payments_for(&self, child_id: ChildId) -> u64 {
        self.read(|doc| {
            doc.payments
                .values()
                .filter(|p| p.child_id == child_id)
                .count() as u64
        })
        .await
    }

    // === Lessons ===

    pub async fn insert_lesson(&self, lesson: Lesson) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.lessons.insert(lesson.id, lesson);
        })
        .await
    }

    pub async fn lesson(&self, id: LessonId) -> Option<Lesson> {
        self.read(|doc| doc.lessons.get(&id).cloned()).await
    }

    /// Lessons owned by any of `owners`, optionally narrowed to one child.
    /// Newest date first, start time ascending within a date.
    pub async fn lessons(&self, owners: &[OperatorId], child_id: Option<ChildId>) -> Vec<Lesson> {
        self.read(|doc| {
            let mut out: Vec<Lesson> = doc
                .lessons
                .values()
                .filter(|l| owners.contains(&l.operator))
                .filter(|l| child_id.is_none_or(|id| l.child_id == id))
                .cloned()
                .collect();
            out.sort_by(|a, b| b.date.cmp(&a.date).then(a.start_time.cmp(&b.start_time)));
            out
        })
        .await
    }

    pub async fn update_lesson(
        &self,
        id: LessonId,
        f: impl FnOnce(&mut Lesson),
    ) -> Result<Option<Lesson>, StoreError> {
        self.mutate(|doc| {
            doc.lessons.get_mut(&id).map(|lesson| {
                f(lesson);
                lesson.updated_at = chrono::Utc::now();
                lesson.clone()
            })
        })
        .await
    }

    pub async fn delete_lesson(&self, id: LessonId) -> Result<bool, StoreError> {
        self.mutate(|doc| doc.lessons.remove(&id).is_some()).await
    }

    // === Payments ===

    pub async fn insert_payment(&self, payment: Payment) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.payments.insert(payment.id, payment);
        })
        .await
    }

    pub async fn payment(&self, id: PaymentId) -> Option<Payment> {
        self.read(|doc| doc.payments.get(&id).cloned()).await
    }

    /// Payments owned by any of `owners`, newest payment date first.
    pub async fn payments(
        &self,
        owners: &[OperatorId],
        child_id: Option<ChildId>,
    ) -> Vec<Payment> {
        self.read(|doc| {
            let mut out: Vec<Payment> = doc
                .payments
                .values()
                .filter(|p| owners.contains(&p.operator))
                .filter(|p| child_id.is_none_or(|id| p.child_id == id))
                .cloned()
                .collect();
            out.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
            out
        })
        .await
    }

    pub async fn delete_payment(&self, id: PaymentId) -> Result<bool, StoreError> {
        self.mutate(|doc| doc.payments.remove(&id).is_some()).await
    }

    // === Operators ===

    /// Inserts or refreshes an operator profile, preserving `created_at`.
    pub async fn upsert_operator(&self, profile: OperatorProfile) -> Result<(), StoreError> {
        self.mutate(|doc| match doc.users.get_mut(&profile.id) {
            Some(existing) => {
                existing.username = profile.username;
                existing.first_name = profile.first_name;
                existing.updated_at = chrono::Utc::now();
            }
            None => {
                doc.users.insert(profile.id, profile);
            }
        })
        .await
    }

    pub async fn operators(&self) -> Vec<OperatorProfile> {
        self.read(|doc| {
            let mut out: Vec<OperatorProfile> = doc.users.values().cloned().collect();
            out.sort_by_key(|p| p.id);
            out
        })
        .await
    }
}

fn write_json_file(path: &Path, document: &Document) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(document)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::Money;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn children_listing_is_scoped_and_sorted() {
        let store = Store::in_memory();
        let alice = OperatorId::new(1);
        let mallory = OperatorId::new(99);

        let first = Child::new(alice, "Антон".to_string(), 7, Money::from_major(300));
        let second = Child::new(alice, "Марія".to_string(), 9, Money::from_major(250));
        let foreign = Child::new(mallory, "Чужий".to_string(), 8, Money::ZERO);
        store.insert_child(first.clone()).await.unwrap();
        store.insert_child(second.clone()).await.unwrap();
        store.insert_child(foreign).await.unwrap();

        let listed = store.children(&[alice], ArchivedFilter::Active).await;
        assert_eq!(
            listed.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
    }

    #[tokio::test]
    async fn archived_filter_splits_listings() {
        let store = Store::in_memory();
        let op = OperatorId::new(1);
        let child = Child::new(op, "Антон".to_string(), 7, Money::from_major(300));
        let id = child.id;
        store.insert_child(child).await.unwrap();
        store
            .update_child(id, |c| c.archived = true)
            .await
            .unwrap();

        assert!(store.children(&[op], ArchivedFilter::Active).await.is_empty());
        assert_eq!(store.children(&[op], ArchivedFilter::Archived).await.len(), 1);
        assert_eq!(store.children(&[op], ArchivedFilter::Any).await.len(), 1);
    }

    #[tokio::test]
    async fn update_unknown_child_writes_nothing() {
        let store = Store::in_memory();
        let updated = store
            .update_child(ChildId::new(), |c| c.name = "x".to_string())
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn file_store_round_trips_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urok.json");
        let op = OperatorId::new(1);

        let child = Child::new(op, "Антон".to_string(), 7, Money::from_major(300));
        let child_id = child.id;
        {
            let store = Store::open(&path).unwrap();
            store.insert_child(child.clone()).await.unwrap();
            let lesson = Lesson::new(
                op,
                child_id,
                date(2024, 11, 14),
                "10:00".parse().unwrap(),
                "11:00".parse().unwrap(),
            )
            .unwrap();
            store.insert_lesson(lesson).await.unwrap();
            let payment = Payment::new(
                op,
                child_id,
                Money::from_major(1500),
                5,
                date(2024, 11, 14),
                None,
            );
            store.insert_payment(payment).await.unwrap();
            store
                .upsert_operator(OperatorProfile::new(
                    op,
                    Some("alice".to_string()),
                    Some("Alice".to_string()),
                ))
                .await
                .unwrap();
        }

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.child(child_id).await.unwrap().name, "Антон");
        assert_eq!(reopened.lessons(&[op], None).await.len(), 1);
        assert_eq!(reopened.payments(&[op], Some(child_id)).await.len(), 1);
        assert_eq!(reopened.operators().await.len(), 1);
        assert_eq!(reopened.count_lessons_for(child_id).await, 1);
        assert_eq!(reopened.count_payments_for(child_id).await, 1);
    }

    #[tokio::test]
    async fn lessons_sorted_newest_date_first_then_start() {
        let store = Store::in_memory();
        let op = OperatorId::new(1);
        let child = ChildId::new();
        for (d, start, end) in [
            (date(2024, 11, 14), "12:00", "13:00"),
            (date(2024, 11, 15), "09:00", "10:00"),
            (date(2024, 11, 14), "10:00", "11:00"),
        ] {
            let lesson =
                Lesson::new(op, child, d, start.parse().unwrap(), end.parse().unwrap()).unwrap();
            store.insert_lesson(lesson).await.unwrap();
        }

        let listed = store.lessons(&[op], None).await;
        let keys: Vec<(NaiveDate, String)> = listed
            .iter()
            .map(|l| (l.date, l.start_time.to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (date(2024, 11, 15), "09:00".to_string()),
                (date(2024, 11, 14), "10:00".to_string()),
                (date(2024, 11, 14), "12:00".to_string()),
            ]
        );
    }
}
