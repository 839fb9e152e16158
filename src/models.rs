use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordError;

/// Tag an author attaches to feedback when submitting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentTag {
    Positive,
    Neutral,
    Constructive,
}

impl SentimentTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentTag::Positive => "positive",
            SentimentTag::Neutral => "neutral",
            SentimentTag::Constructive => "constructive",
        }
    }

    /// Lenient parse for stored values. Blank or unknown tags become `None`.
    pub fn parse_stored(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| value.parse().ok())
    }
}

impl FromStr for SentimentTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentTag::Positive),
            "neutral" => Ok(SentimentTag::Neutral),
            "constructive" | "negative" => Ok(SentimentTag::Constructive),
            other => Err(format!("unknown sentiment tag {other:?}")),
        }
    }
}

impl fmt::Display for SentimentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub rating: i32,
    pub content: String,
    pub sentiment: Option<SentimentTag>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn validate(&self) -> Result<(), RecordError> {
        if !(1..=5).contains(&self.rating) {
            return Err(RecordError::RatingOutOfRange(self.rating));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub motivation: i32,
    pub collaboration: i32,
    pub communication: i32,
    pub workload: i32,
    pub satisfaction: i32,
    pub created_at: DateTime<Utc>,
}

impl HealthCheckRecord {
    pub fn validate(&self) -> Result<(), RecordError> {
        let fields = [
            ("motivation", self.motivation),
            ("collaboration", self.collaboration),
            ("communication", self.communication),
            ("workload", self.workload),
            ("satisfaction", self.satisfaction),
        ];
        for (field, value) in fields {
            if !(1..=10).contains(&value) {
                return Err(RecordError::ScoreOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

/// Team health on a 0-100 scale. Recomputed per query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedTeamHealth {
    pub team_id: Option<Uuid>,
    pub motivation: f64,
    pub collaboration: f64,
    pub communication: f64,
    pub workload: f64,
    /// Collected by the survey but left out of the overview and radar.
    pub satisfaction: f64,
    pub sample_count: usize,
}

impl AggregatedTeamHealth {
    pub fn empty(team_id: Option<Uuid>) -> Self {
        Self {
            team_id,
            motivation: 0.0,
            collaboration: 0.0,
            communication: 0.0,
            workload: 0.0,
            satisfaction: 0.0,
            sample_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub constructive: usize,
}

impl SentimentDistribution {
    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.constructive
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeEntry {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthTrendPoint {
    pub week_start: NaiveDate,
    pub health: AggregatedTeamHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPoint {
    pub date: NaiveDate,
    pub rating: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub user_id: Uuid,
    pub display_name: String,
    pub feedback_count: usize,
    pub average_rating: Option<f64>,
}

/// Names for a team and its members, as looked up from the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDirectory {
    pub team_id: Uuid,
    pub team_name: String,
    pub members: HashMap<Uuid, String>,
}

impl TeamDirectory {
    pub fn member_name(&self, user_id: &Uuid) -> &str {
        self.members
            .get(user_id)
            .map(String::as_str)
            .unwrap_or("Unknown member")
    }
}
