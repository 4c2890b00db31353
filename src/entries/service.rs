use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    codec,
    models::{PlayerRecord, SlimEntry, StatField, StoredEntry, TeamContext, TeamRecord},
    repository::EntryRepository,
    types::{
        AllEntriesResponse, BackfillResponse, DateEntriesResponse, DatesResponse, DeleteResponse,
        MinMaxResponse, SaveBatchResponse,
    },
};
use crate::shared::AppError;

/// Service for the player-day entry workflows: batch merge & save, scoring
/// backfill, queries and deletions.
pub struct EntryService {
    repository: Arc<dyn EntryRepository + Send + Sync>,
}

impl EntryService {
    pub fn new(repository: Arc<dyn EntryRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Full scan, shaped for transfer: redundant fields stripped, payload
    /// gzipped and base64-encoded.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<AllEntriesResponse, AppError> {
        let entries = self.repository.all_entries().await?;
        let count = entries.len();

        let slim: Vec<SlimEntry> = entries.into_iter().map(SlimEntry::from).collect();
        let data = codec::encode_payload(&slim)?;

        info!(count, encoded_length = data.len(), "Fetched all entries");
        Ok(AllEntriesResponse {
            data,
            content_encoding: "gzip".to_string(),
            count,
        })
    }

    /// Merges players with their team's public context and bulk-inserts the
    /// result for `date`.
    ///
    /// Replay policy: if the date already holds entries the call is a no-op
    /// and reports `skipped: true`. Corrections go through DELETE_DATE first.
    #[instrument(skip(self, players, teams), fields(players = players.len()))]
    pub async fn save_batch(
        &self,
        date: &str,
        players: Vec<PlayerRecord>,
        teams: Option<Vec<TeamRecord>>,
    ) -> Result<SaveBatchResponse, AppError> {
        validate_date(date)?;

        if self.repository.date_has_entries(date).await? {
            warn!(date = %date, "Entries already exist for date, skipping batch");
            return Ok(SaveBatchResponse {
                inserted: 0,
                skipped: true,
            });
        }

        let contexts: HashMap<i64, TeamContext> = teams
            .map(|teams| {
                teams
                    .iter()
                    .map(|team| (team.id, team.public_view()))
                    .collect()
            })
            .unwrap_or_default();

        let mut merged = Vec::with_capacity(players.len());
        for player in players {
            let context = match contexts.get(&player.team_id) {
                Some(context) => context.clone(),
                None => player.context.clone().ok_or_else(|| {
                    AppError::Validation(format!(
                        "no team record or inline team context for team_id {}",
                        player.team_id
                    ))
                })?,
            };
            merged.push(StoredEntry::merge(date, player, context));
        }

        if merged.is_empty() {
            info!(date = %date, "No items to save");
            return Ok(SaveBatchResponse {
                inserted: 0,
                skipped: false,
            });
        }

        let inserted = self.repository.insert_entries(merged).await?;
        info!(date = %date, inserted, "Saved batch");
        Ok(SaveBatchResponse {
            inserted,
            skipped: false,
        })
    }

    /// Applies scoring outcomes per date: ids in the set become `scored=true`,
    /// every other entry on that date `scored=false`. Idempotent; re-running
    /// with a different set overwrites (last call wins). Returns the number
    /// of dates processed.
    #[instrument(skip(self, data), fields(dates = data.len()))]
    pub async fn backfill(
        &self,
        data: HashMap<String, Vec<i64>>,
    ) -> Result<BackfillResponse, AppError> {
        for date in data.keys() {
            validate_date(date)?;
        }

        for (date, scorers) in &data {
            let counts = self.repository.apply_outcomes(date, scorers).await?;
            info!(
                date = %date,
                scored = counts.scored,
                unscored = counts.unscored,
                "Backfilled scoring outcomes"
            );
        }

        Ok(BackfillResponse {
            num_backfilled: data.len(),
        })
    }

    /// Distinct dates still awaiting a scoring decision.
    #[instrument(skip(self))]
    pub async fn dates_without_outcome(&self) -> Result<DatesResponse, AppError> {
        let dates = self.repository.unscored_dates().await?;
        Ok(DatesResponse { dates })
    }

    /// Entries for one date, internal row id excluded.
    #[instrument(skip(self))]
    pub async fn entries_for_date(&self, date: &str) -> Result<DateEntriesResponse, AppError> {
        validate_date(date)?;
        let entries = self.repository.entries_for_date(date).await?;
        Ok(DateEntriesResponse {
            date: date.to_string(),
            entries,
        })
    }

    /// Independent min/max per stat field across the whole collection. Fields
    /// with no numeric values are omitted; an empty collection is reported as
    /// not found.
    #[instrument(skip(self))]
    pub async fn min_max(&self) -> Result<MinMaxResponse, AppError> {
        let mut ranges = BTreeMap::new();
        for field in StatField::ALL {
            if let Some(range) = self.repository.stat_bounds(field).await? {
                ranges.insert(field, range);
            }
        }

        if ranges.is_empty() {
            return Err(AppError::NotFound("no entries to aggregate".to_string()));
        }
        Ok(ranges)
    }

    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> Result<DeleteResponse, AppError> {
        let num_deleted = self.repository.delete_all().await?;
        info!(num_deleted, "Deleted all entries");
        Ok(DeleteResponse { num_deleted })
    }

    #[instrument(skip(self))]
    pub async fn delete_date(&self, date: &str) -> Result<DeleteResponse, AppError> {
        validate_date(date)?;
        let num_deleted = self.repository.delete_date(date).await?;
        info!(date = %date, num_deleted, "Deleted entries for date");
        Ok(DeleteResponse { num_deleted })
    }

    #[instrument(skip(self))]
    pub async fn delete_game(
        &self,
        date: &str,
        home: &str,
        away: &str,
    ) -> Result<DeleteResponse, AppError> {
        validate_date(date)?;
        let num_deleted = self.repository.delete_game(date, home, away).await?;
        info!(date = %date, home = %home, away = %away, num_deleted, "Deleted game");
        Ok(DeleteResponse { num_deleted })
    }
}

fn validate_date(date: &str) -> Result<(), AppError> {
    let well_formed =
        date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
    if well_formed {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "invalid date '{date}', expected YYYY-MM-DD"
        )))
    }
}
