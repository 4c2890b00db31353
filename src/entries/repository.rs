use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    Client, Collection,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{BackfillCounts, StatField, StatRange, StoredEntry};
use crate::shared::AppError;

/// Storage seam for the single player-day collection. Filters and update
/// operators stay behind this trait; callers speak in domain terms.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Bulk-inserts merged entries in one write burst.
    async fn insert_entries(&self, entries: Vec<StoredEntry>) -> Result<usize, AppError>;

    /// Full scan of the collection.
    async fn all_entries(&self) -> Result<Vec<StoredEntry>, AppError>;

    /// Entries matching one calendar date.
    async fn entries_for_date(&self, date: &str) -> Result<Vec<StoredEntry>, AppError>;

    /// Replay guard probe: does the date already hold any entries?
    async fn date_has_entries(&self, date: &str) -> Result<bool, AppError>;

    /// Distinct dates still carrying at least one pending (`scored` null) entry.
    async fn unscored_dates(&self) -> Result<Vec<String>, AppError>;

    /// Marks `scored=true` for the given ids on `date` and `scored=false` for
    /// every other entry on that date. Returns how many entries each side
    /// matched.
    async fn apply_outcomes(
        &self,
        date: &str,
        scorers: &[i64],
    ) -> Result<BackfillCounts, AppError>;

    /// Minimum and maximum of one numeric field across the whole collection,
    /// or `None` when no entry carries a numeric value for it.
    async fn stat_bounds(&self, field: StatField) -> Result<Option<StatRange>, AppError>;

    async fn delete_all(&self) -> Result<u64, AppError>;

    async fn delete_date(&self, date: &str) -> Result<u64, AppError>;

    /// Deletes both sides of one game: entries on `date` whose team
    /// abbreviation matches either supplied value.
    async fn delete_game(&self, date: &str, home: &str, away: &str) -> Result<u64, AppError>;
}

#[derive(Debug, Default)]
pub struct InMemoryEntryRepository {
    entries: Arc<RwLock<Vec<StoredEntry>>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn insert_entries(&self, entries: Vec<StoredEntry>) -> Result<usize, AppError> {
        let inserted = entries.len();
        let mut store = self.entries.write().await;
        store.extend(entries);
        Ok(inserted)
    }

    async fn all_entries(&self) -> Result<Vec<StoredEntry>, AppError> {
        let store = self.entries.read().await;
        Ok(store.clone())
    }

    async fn entries_for_date(&self, date: &str) -> Result<Vec<StoredEntry>, AppError> {
        let store = self.entries.read().await;
        Ok(store.iter().filter(|entry| entry.date == date).cloned().collect())
    }

    async fn date_has_entries(&self, date: &str) -> Result<bool, AppError> {
        let store = self.entries.read().await;
        Ok(store.iter().any(|entry| entry.date == date))
    }

    async fn unscored_dates(&self) -> Result<Vec<String>, AppError> {
        let store = self.entries.read().await;
        let dates: BTreeSet<String> = store
            .iter()
            .filter(|entry| entry.scored.is_none())
            .map(|entry| entry.date.clone())
            .collect();
        Ok(dates.into_iter().collect())
    }

    async fn apply_outcomes(
        &self,
        date: &str,
        scorers: &[i64],
    ) -> Result<BackfillCounts, AppError> {
        let mut store = self.entries.write().await;
        let mut counts = BackfillCounts::default();
        for entry in store.iter_mut().filter(|entry| entry.date == date) {
            if scorers.contains(&entry.id) {
                entry.scored = Some(true);
                counts.scored += 1;
            } else {
                entry.scored = Some(false);
                counts.unscored += 1;
            }
        }
        Ok(counts)
    }

    async fn stat_bounds(&self, field: StatField) -> Result<Option<StatRange>, AppError> {
        let store = self.entries.read().await;
        let mut bounds: Option<StatRange> = None;
        for entry in store.iter() {
            let value = field.value_of(entry);
            bounds = Some(match bounds {
                Some(range) => StatRange {
                    min: range.min.min(value),
                    max: range.max.max(value),
                },
                None => StatRange { min: value, max: value },
            });
        }
        Ok(bounds)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let mut store = self.entries.write().await;
        let deleted = store.len() as u64;
        store.clear();
        Ok(deleted)
    }

    async fn delete_date(&self, date: &str) -> Result<u64, AppError> {
        let mut store = self.entries.write().await;
        let before = store.len();
        store.retain(|entry| entry.date != date);
        Ok((before - store.len()) as u64)
    }

    async fn delete_game(&self, date: &str, home: &str, away: &str) -> Result<u64, AppError> {
        let mut store = self.entries.write().await;
        let before = store.len();
        store.retain(|entry| {
            entry.date != date || (entry.team.team_abbr != home && entry.team.team_abbr != away)
        });
        Ok((before - store.len()) as u64)
    }
}

/// MongoDB-backed repository over the managed players collection.
#[derive(Debug, Clone)]
pub struct MongoEntryRepository {
    collection: Collection<Document>,
}

impl MongoEntryRepository {
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        Self {
            collection: client.database(database).collection::<Document>(collection),
        }
    }

    async fn find_entries(&self, filter: Document) -> Result<Vec<StoredEntry>, AppError> {
        let mut cursor = self
            .collection
            .find(filter)
            .projection(doc! { "_id": 0 })
            .await?;

        let mut entries = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            entries.push(bson::from_document(document)?);
        }
        Ok(entries)
    }
}

fn numeric_field(document: &Document, field: &str) -> Option<f64> {
    match document.get(field) {
        Some(Bson::Double(value)) => Some(*value),
        Some(Bson::Int32(value)) => Some(f64::from(*value)),
        Some(Bson::Int64(value)) => Some(*value as f64),
        _ => None,
    }
}

#[async_trait]
impl EntryRepository for MongoEntryRepository {
    async fn insert_entries(&self, entries: Vec<StoredEntry>) -> Result<usize, AppError> {
        let documents = entries
            .iter()
            .map(bson::to_document)
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.collection.insert_many(documents).await?;
        Ok(result.inserted_ids.len())
    }

    async fn all_entries(&self) -> Result<Vec<StoredEntry>, AppError> {
        self.find_entries(doc! {}).await
    }

    async fn entries_for_date(&self, date: &str) -> Result<Vec<StoredEntry>, AppError> {
        self.find_entries(doc! { "date": date }).await
    }

    async fn date_has_entries(&self, date: &str) -> Result<bool, AppError> {
        let count = self
            .collection
            .count_documents(doc! { "date": date })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    async fn unscored_dates(&self) -> Result<Vec<String>, AppError> {
        let values = self
            .collection
            .distinct("date", doc! { "scored": null })
            .await?;
        Ok(values
            .into_iter()
            .filter_map(|value| value.as_str().map(str::to_owned))
            .collect())
    }

    async fn apply_outcomes(
        &self,
        date: &str,
        scorers: &[i64],
    ) -> Result<BackfillCounts, AppError> {
        let ids: Vec<Bson> = scorers.iter().copied().map(Bson::from).collect();

        let scored = self
            .collection
            .update_many(
                doc! { "date": date, "id": { "$in": ids.clone() } },
                doc! { "$set": { "scored": true } },
            )
            .await?;

        let unscored = self
            .collection
            .update_many(
                doc! { "date": date, "id": { "$nin": ids } },
                doc! { "$set": { "scored": false } },
            )
            .await?;

        Ok(BackfillCounts {
            scored: scored.matched_count,
            unscored: unscored.matched_count,
        })
    }

    async fn stat_bounds(&self, field: StatField) -> Result<Option<StatRange>, AppError> {
        let name = field.as_str();
        // Entries from older schema revisions may lack the field entirely;
        // restrict the sorted probes to numeric values.
        let filter = doc! { name: { "$type": "number" } };

        let lowest = self
            .collection
            .find_one(filter.clone())
            .sort(doc! { name: 1 })
            .await?;
        let highest = self
            .collection
            .find_one(filter)
            .sort(doc! { name: -1 })
            .await?;

        let bounds = match (lowest, highest) {
            (Some(low), Some(high)) => {
                match (numeric_field(&low, name), numeric_field(&high, name)) {
                    (Some(min), Some(max)) => Some(StatRange { min, max }),
                    _ => None,
                }
            }
            _ => None,
        };
        Ok(bounds)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let result = self.collection.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn delete_date(&self, date: &str) -> Result<u64, AppError> {
        let result = self.collection.delete_many(doc! { "date": date }).await?;
        Ok(result.deleted_count)
    }

    async fn delete_game(&self, date: &str, home: &str, away: &str) -> Result<u64, AppError> {
        let result = self
            .collection
            .delete_many(doc! { "date": date, "team_abbr": { "$in": [home, away] } })
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::models::TeamContext;

    fn entry(date: &str, id: i64, abbr: &str, gpg: f64) -> StoredEntry {
        StoredEntry {
            date: date.to_string(),
            scored: None,
            id,
            name: format!("player-{id}"),
            gpg,
            hgpg: gpg + 0.1,
            five_gpg: gpg / 2.0,
            hppg: None,
            team: TeamContext {
                team_abbr: abbr.to_string(),
                tgpg: 3.0,
                otga: 2.5,
                otshga: None,
            },
        }
    }

    #[tokio::test]
    async fn insert_and_query_by_date() {
        let repo = InMemoryEntryRepository::new();
        repo.insert_entries(vec![
            entry("2024-10-10", 1, "PHI", 0.2),
            entry("2024-10-10", 2, "NJD", 0.3),
            entry("2024-10-11", 3, "TOR", 0.4),
        ])
        .await
        .unwrap();

        assert!(repo.date_has_entries("2024-10-10").await.unwrap());
        assert!(!repo.date_has_entries("2024-09-30").await.unwrap());

        let entries = repo.entries_for_date("2024-10-10").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.date == "2024-10-10"));
    }

    #[tokio::test]
    async fn apply_outcomes_partitions_the_date() {
        let repo = InMemoryEntryRepository::new();
        repo.insert_entries(vec![
            entry("2024-10-10", 1, "PHI", 0.2),
            entry("2024-10-10", 2, "NJD", 0.3),
            entry("2024-10-11", 3, "TOR", 0.4),
        ])
        .await
        .unwrap();

        let counts = repo.apply_outcomes("2024-10-10", &[1]).await.unwrap();
        assert_eq!(counts.scored, 1);
        assert_eq!(counts.unscored, 1);

        let entries = repo.entries_for_date("2024-10-10").await.unwrap();
        let scored = entries.iter().find(|entry| entry.id == 1).unwrap();
        let unscored = entries.iter().find(|entry| entry.id == 2).unwrap();
        assert_eq!(scored.scored, Some(true));
        assert_eq!(unscored.scored, Some(false));

        // Other dates stay pending.
        let other = repo.entries_for_date("2024-10-11").await.unwrap();
        assert_eq!(other[0].scored, None);
    }

    #[tokio::test]
    async fn unscored_dates_shrink_after_backfill() {
        let repo = InMemoryEntryRepository::new();
        repo.insert_entries(vec![
            entry("2024-10-10", 1, "PHI", 0.2),
            entry("2024-10-11", 2, "NJD", 0.3),
        ])
        .await
        .unwrap();

        let dates = repo.unscored_dates().await.unwrap();
        assert_eq!(dates, vec!["2024-10-10", "2024-10-11"]);

        repo.apply_outcomes("2024-10-10", &[1]).await.unwrap();
        let dates = repo.unscored_dates().await.unwrap();
        assert_eq!(dates, vec!["2024-10-11"]);
    }

    #[tokio::test]
    async fn stat_bounds_cover_the_whole_collection() {
        let repo = InMemoryEntryRepository::new();
        assert!(repo.stat_bounds(StatField::Gpg).await.unwrap().is_none());

        repo.insert_entries(vec![
            entry("2024-10-10", 1, "PHI", 0.1),
            entry("2024-10-11", 2, "NJD", 0.9),
            entry("2024-10-12", 3, "TOR", 0.4),
        ])
        .await
        .unwrap();

        let range = repo.stat_bounds(StatField::Gpg).await.unwrap().unwrap();
        assert_eq!(range.min, 0.1);
        assert_eq!(range.max, 0.9);
    }

    #[tokio::test]
    async fn delete_game_removes_both_sides_only() {
        let repo = InMemoryEntryRepository::new();
        repo.insert_entries(vec![
            entry("2024-10-10", 1, "PHI", 0.2),
            entry("2024-10-10", 2, "NJD", 0.3),
            entry("2024-10-10", 3, "TOR", 0.4),
            entry("2024-10-11", 4, "PHI", 0.5),
        ])
        .await
        .unwrap();

        let deleted = repo.delete_game("2024-10-10", "PHI", "NJD").await.unwrap();
        assert_eq!(deleted, 2);

        let remaining = repo.all_entries().await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().any(|entry| entry.id == 3));
        // Same team on another date is untouched.
        assert!(remaining.iter().any(|entry| entry.id == 4));
    }

    #[tokio::test]
    async fn delete_date_is_scoped() {
        let repo = InMemoryEntryRepository::new();
        repo.insert_entries(vec![
            entry("2024-10-10", 1, "PHI", 0.2),
            entry("2024-10-11", 2, "NJD", 0.3),
        ])
        .await
        .unwrap();

        assert_eq!(repo.delete_date("2024-10-10").await.unwrap(), 1);
        assert_eq!(repo.all_entries().await.unwrap().len(), 1);
        assert_eq!(repo.delete_all().await.unwrap(), 1);
        assert!(repo.all_entries().await.unwrap().is_empty());
    }
}
