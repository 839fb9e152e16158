use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

use crate::models::{
    AggregatedTeamHealth, FeedbackRecord, HealthCheckRecord, HealthTrendPoint, RatingPoint,
    SentimentDistribution, SentimentTag,
};

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn scaled_mean(total: i64, count: usize) -> f64 {
    round1(total as f64 / count as f64 * 10.0)
}

/// Averages survey scores and rescales them from 1-10 onto 0-100.
pub fn aggregate_health(records: &[HealthCheckRecord]) -> AggregatedTeamHealth {
    let team_id = common_team(records);
    if records.is_empty() {
        return AggregatedTeamHealth::empty(team_id);
    }

    let mut totals = [0i64; 5];
    for record in records {
        totals[0] += record.motivation as i64;
        totals[1] += record.collaboration as i64;
        totals[2] += record.communication as i64;
        totals[3] += record.workload as i64;
        totals[4] += record.satisfaction as i64;
    }

    let count = records.len();
    AggregatedTeamHealth {
        team_id,
        motivation: scaled_mean(totals[0], count),
        collaboration: scaled_mean(totals[1], count),
        communication: scaled_mean(totals[2], count),
        workload: scaled_mean(totals[3], count),
        satisfaction: scaled_mean(totals[4], count),
        sample_count: count,
    }
}

fn common_team(records: &[HealthCheckRecord]) -> Option<Uuid> {
    let first = records.first()?.team_id;
    records
        .iter()
        .all(|record| record.team_id == first)
        .then_some(first)
}

/// Mean of the four displayed categories. Satisfaction is excluded.
pub fn overall_health(health: &AggregatedTeamHealth) -> f64 {
    if health.sample_count == 0 {
        return 0.0;
    }
    round1(
        (health.motivation + health.collaboration + health.communication + health.workload) / 4.0,
    )
}

/// Tallies author-supplied tags. Untagged feedback is left out.
pub fn aggregate_sentiment(records: &[FeedbackRecord]) -> SentimentDistribution {
    let mut distribution = SentimentDistribution::default();
    for record in records {
        match record.sentiment {
            Some(SentimentTag::Positive) => distribution.positive += 1,
            Some(SentimentTag::Neutral) => distribution.neutral += 1,
            Some(SentimentTag::Constructive) => distribution.constructive += 1,
            None => {}
        }
    }
    distribution
}

/// Whole-percent share of tagged feedback that is positive.
pub fn positive_share(distribution: &SentimentDistribution) -> Option<f64> {
    let total = distribution.total();
    if total == 0 {
        return None;
    }
    Some((distribution.positive as f64 / total as f64 * 100.0).round())
}

/// Mean rating, or `None` when there is nothing to average.
pub fn average_rating(records: &[FeedbackRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let total: i64 = records.iter().map(|record| record.rating as i64).sum();
    Some(total as f64 / records.len() as f64)
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Health aggregated per calendar week (Monday start, UTC), oldest week first.
pub fn health_trend(records: &[HealthCheckRecord]) -> Vec<HealthTrendPoint> {
    let mut weeks: BTreeMap<NaiveDate, Vec<HealthCheckRecord>> = BTreeMap::new();
    for record in records {
        weeks
            .entry(week_start(record.created_at.date_naive()))
            .or_default()
            .push(record.clone());
    }

    weeks
        .into_iter()
        .map(|(week_start, bucket)| HealthTrendPoint {
            week_start,
            health: aggregate_health(&bucket),
        })
        .collect()
}

/// Ratings in submission order for the trend line.
pub fn rating_trend(records: &[FeedbackRecord]) -> Vec<RatingPoint> {
    let mut ordered: Vec<&FeedbackRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.created_at);
    ordered
        .into_iter()
        .map(|record| RatingPoint {
            date: record.created_at.date_naive(),
            rating: record.rating,
        })
        .collect()
}

pub fn score_label(score: i32) -> &'static str {
    match score {
        s if s >= 9 => "Excellent",
        s if s >= 7 => "Good",
        s if s >= 5 => "Average",
        _ => "Needs Attention",
    }
}

pub fn rating_label(rating: i32) -> Option<&'static str> {
    match rating {
        1 => Some("Needs Improvement"),
        2 => Some("Below Average"),
        3 => Some("Good"),
        4 => Some("Very Good"),
        5 => Some("Excellent"),
        _ => None,
    }
}
