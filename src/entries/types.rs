use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use super::models::{PlayerRecord, StatField, StatRange, StoredEntry, TeamRecord};
use crate::shared::AppError;

/// The request envelope, parsed at the boundary into one variant per
/// operation. Unknown discriminators are rejected here, before any business
/// logic runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiRequest {
    GetAll,
    PostBatch {
        date: String,
        players: Vec<PlayerRecord>,
        #[serde(default)]
        teams: Option<Vec<TeamRecord>>,
    },
    GetDatesNoScored,
    PostBackfill {
        #[serde(default)]
        data: HashMap<String, Vec<i64>>,
    },
    DeleteAll,
    GetMinMax,
    GetDate {
        date: String,
    },
    DeleteDate {
        date: String,
    },
    DeleteGame {
        date: String,
        home: String,
        away: String,
    },
}

const KNOWN_METHODS: [&str; 9] = [
    "GET_ALL",
    "POST_BATCH",
    "GET_DATES_NO_SCORED",
    "POST_BACKFILL",
    "DELETE_ALL",
    "GET_MIN_MAX",
    "GET_DATE",
    "DELETE_DATE",
    "DELETE_GAME",
];

impl ApiRequest {
    /// Parses a raw envelope. A missing or malformed payload for a known
    /// method is a validation error; an unrecognized method is its own error
    /// class so the dispatcher can keep the historical status mapping.
    pub fn from_value(mut value: Value) -> Result<Self, AppError> {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::Validation("request is missing a 'method' discriminator".to_string())
            })?;

        if !KNOWN_METHODS.contains(&method) {
            return Err(AppError::UnknownMethod(method.to_string()));
        }

        // Upstream schedulers echo the previous statusCode back into the
        // envelope; drop it before matching the payload shape.
        if let Some(object) = value.as_object_mut() {
            object.remove("statusCode");
        }

        serde_json::from_value(value).map_err(|err| AppError::Validation(err.to_string()))
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            ApiRequest::GetAll => "GET_ALL",
            ApiRequest::PostBatch { .. } => "POST_BATCH",
            ApiRequest::GetDatesNoScored => "GET_DATES_NO_SCORED",
            ApiRequest::PostBackfill { .. } => "POST_BACKFILL",
            ApiRequest::DeleteAll => "DELETE_ALL",
            ApiRequest::GetMinMax => "GET_MIN_MAX",
            ApiRequest::GetDate { .. } => "GET_DATE",
            ApiRequest::DeleteDate { .. } => "DELETE_DATE",
            ApiRequest::DeleteGame { .. } => "DELETE_GAME",
        }
    }
}

/// Body for `GET_ALL`: entries serialized, gzipped and base64-encoded.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AllEntriesResponse {
    pub data: String,
    pub content_encoding: String,
    pub count: usize,
}

/// Body for `POST_BATCH`. `skipped` reports the replay guard explicitly:
/// re-ingesting an already-populated date is a documented no-op, not a
/// silent one.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveBatchResponse {
    pub inserted: usize,
    pub skipped: bool,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct BackfillResponse {
    pub num_backfilled: usize,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct DatesResponse {
    pub dates: Vec<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct DateEntriesResponse {
    pub date: String,
    pub entries: Vec<StoredEntry>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub num_deleted: u64,
}

/// Body for `GET_MIN_MAX`: one `{min, max}` pair per stat field.
pub type MinMaxResponse = BTreeMap<StatField, StatRange>;
