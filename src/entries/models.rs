use serde::{Deserialize, Serialize};

/// One player row as produced by the upstream stats job.
///
/// Rolling rates (`gpg`, `hgpg`, `five_gpg`, `hppg`) are computed upstream and
/// passed through untouched. `stat` is the upstream blended power score; it is
/// input-only and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: i64,
    pub name: String,
    pub team_id: i64,
    pub gpg: f64,
    pub hgpg: f64,
    pub five_gpg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hppg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<f64>,
    /// Pre-merged team context for the lean payload variant where the caller
    /// sends no `teams` array.
    #[serde(flatten)]
    pub context: Option<TeamContext>,
}

/// One team row for a given slate date. Joined into each of its players at
/// save time and then discarded; never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: i64,
    pub name: String,
    pub abbr: String,
    pub opponent_id: i64,
    pub season: String,
    pub tgpg: f64,
    pub otga: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otshga: Option<f64>,
}

impl TeamRecord {
    /// The public view of a team that survives the merge. `id`, `name`,
    /// `opponent_id` and `season` are internal-only and stop here.
    pub fn public_view(&self) -> TeamContext {
        TeamContext {
            team_abbr: self.abbr.clone(),
            tgpg: self.tgpg,
            otga: self.otga,
            otshga: self.otshga,
        }
    }
}

/// Team attributes embedded into every stored player entry. This type *is*
/// the exclude-list: anything not listed here never reaches storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamContext {
    pub team_abbr: String,
    pub tgpg: f64,
    pub otga: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otshga: Option<f64>,
}

/// The persisted unit: one player-day document, player fields plus the
/// team's public context.
///
/// `scored` is tri-state: `None` until a backfill for the date arrives, then
/// a terminal `true`/`false`. Stored as an explicit null so the pending state
/// is queryable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub date: String,
    #[serde(default)]
    pub scored: Option<bool>,
    pub id: i64,
    pub name: String,
    pub gpg: f64,
    pub hgpg: f64,
    pub five_gpg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hppg: Option<f64>,
    #[serde(flatten)]
    pub team: TeamContext,
}

impl StoredEntry {
    /// Merges a player with its team's public context into the stored shape.
    /// Drops `stat` and `team_id`, stamps the date and a pending outcome.
    pub fn merge(date: &str, player: PlayerRecord, team: TeamContext) -> Self {
        Self {
            date: date.to_string(),
            scored: None,
            id: player.id,
            name: player.name,
            gpg: player.gpg,
            hgpg: player.hgpg,
            five_gpg: player.five_gpg,
            hppg: player.hppg,
            team,
        }
    }
}

/// Transfer view used by the full-collection query: redundant fields (`id`,
/// `team_abbr`) are stripped to shrink the compressed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlimEntry {
    pub date: String,
    pub scored: Option<bool>,
    pub name: String,
    pub gpg: f64,
    pub hgpg: f64,
    pub five_gpg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hppg: Option<f64>,
    pub tgpg: f64,
    pub otga: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otshga: Option<f64>,
}

impl From<StoredEntry> for SlimEntry {
    fn from(entry: StoredEntry) -> Self {
        Self {
            date: entry.date,
            scored: entry.scored,
            name: entry.name,
            gpg: entry.gpg,
            hgpg: entry.hgpg,
            five_gpg: entry.five_gpg,
            hppg: entry.hppg,
            tgpg: entry.team.tgpg,
            otga: entry.team.otga,
            otshga: entry.team.otshga,
        }
    }
}

/// Numeric fields exposed by the min/max aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    Gpg,
    Hgpg,
    FiveGpg,
    Tgpg,
    Otga,
}

impl StatField {
    pub const ALL: [StatField; 5] = [
        StatField::Gpg,
        StatField::Hgpg,
        StatField::FiveGpg,
        StatField::Tgpg,
        StatField::Otga,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatField::Gpg => "gpg",
            StatField::Hgpg => "hgpg",
            StatField::FiveGpg => "five_gpg",
            StatField::Tgpg => "tgpg",
            StatField::Otga => "otga",
        }
    }

    pub fn value_of(&self, entry: &StoredEntry) -> f64 {
        match self {
            StatField::Gpg => entry.gpg,
            StatField::Hgpg => entry.hgpg,
            StatField::FiveGpg => entry.five_gpg,
            StatField::Tgpg => entry.team.tgpg,
            StatField::Otga => entry.team.otga,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRange {
    pub min: f64,
    pub max: f64,
}

/// Entries matched by the two backfill updates for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillCounts {
    pub scored: u64,
    pub unscored: u64,
}
