use std::collections::HashMap;
use std::fmt::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics;
use crate::models::{
    AggregatedTeamHealth, FeedbackRecord, HealthCheckRecord, HealthTrendPoint, MemberSummary,
    RatingPoint, SentimentDistribution, SentimentTag, TeamDirectory, ThemeEntry,
};
use crate::themes;

const RECENT_FEEDBACK_LIMIT: usize = 5;

/// Everything the dashboard widgets need for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub team_id: Uuid,
    pub sentiment_distribution: SentimentDistribution,
    pub average_rating: Option<f64>,
    pub aggregated_health: AggregatedTeamHealth,
    pub top_themes: Vec<ThemeEntry>,
    pub feedback_count: usize,
}

pub fn build_dashboard_report(
    team_id: Uuid,
    feedback: &[FeedbackRecord],
    health: &[HealthCheckRecord],
) -> DashboardReport {
    let texts: Vec<&str> = feedback.iter().map(|record| record.content.as_str()).collect();

    DashboardReport {
        team_id,
        sentiment_distribution: metrics::aggregate_sentiment(feedback),
        average_rating: metrics::average_rating(feedback),
        aggregated_health: AggregatedTeamHealth {
            team_id: Some(team_id),
            ..metrics::aggregate_health(health)
        },
        top_themes: themes::extract_themes(&texts, themes::DEFAULT_TOP_N),
        feedback_count: feedback.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCards {
    pub total_feedback: usize,
    pub average_rating: Option<f64>,
    pub positive_share: Option<f64>,
    pub team_health: f64,
    pub active_members: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarPoint {
    pub category: String,
    pub score: f64,
    pub full_mark: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFeedback {
    pub rating: i32,
    pub rating_label: Option<String>,
    pub content: String,
    pub sentiment: Option<SentimentTag>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReport {
    pub team_id: Uuid,
    pub team_name: String,
    pub dashboard: DashboardReport,
    pub summary: SummaryCards,
    pub sentiment_bars: Vec<ChartBar>,
    pub health_radar: Vec<RadarPoint>,
    pub health_trend: Vec<HealthTrendPoint>,
    pub rating_trend: Vec<RatingPoint>,
    pub members: Vec<MemberSummary>,
    pub recent_feedback: Vec<RecentFeedback>,
}

pub fn sentiment_bars(distribution: &SentimentDistribution) -> Vec<ChartBar> {
    [
        ("Positive", distribution.positive),
        ("Neutral", distribution.neutral),
        ("Constructive", distribution.constructive),
    ]
    .into_iter()
    .map(|(name, value)| ChartBar {
        name: name.to_string(),
        value,
    })
    .collect()
}

pub fn health_radar(health: &AggregatedTeamHealth) -> Vec<RadarPoint> {
    [
        ("Motivation", health.motivation),
        ("Collaboration", health.collaboration),
        ("Communication", health.communication),
        ("Workload", health.workload),
    ]
    .into_iter()
    .map(|(category, score)| RadarPoint {
        category: category.to_string(),
        score,
        full_mark: 100.0,
    })
    .collect()
}

/// Per-recipient feedback counts. Senders are never exposed.
pub fn summarize_members(
    directory: &TeamDirectory,
    feedback: &[FeedbackRecord],
) -> Vec<MemberSummary> {
    let mut totals: HashMap<Uuid, (usize, i64)> = directory
        .members
        .keys()
        .map(|user_id| (*user_id, (0, 0)))
        .collect();

    for record in feedback {
        let entry = totals.entry(record.to_user_id).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += record.rating as i64;
    }

    let mut summaries: Vec<MemberSummary> = totals
        .into_iter()
        .map(|(user_id, (count, total_rating))| MemberSummary {
            user_id,
            display_name: directory.member_name(&user_id).to_string(),
            feedback_count: count,
            average_rating: if count == 0 {
                None
            } else {
                Some(total_rating as f64 / count as f64)
            },
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.feedback_count
            .cmp(&a.feedback_count)
            .then_with(|| a.display_name.cmp(&b.display_name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    summaries
}

pub fn recent_feedback(feedback: &[FeedbackRecord], limit: usize) -> Vec<RecentFeedback> {
    let mut ordered: Vec<&FeedbackRecord> = feedback.iter().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    ordered
        .into_iter()
        .take(limit)
        .map(|record| RecentFeedback {
            rating: record.rating,
            rating_label: metrics::rating_label(record.rating).map(str::to_string),
            content: record.content.clone(),
            sentiment: record.sentiment,
            date: record.created_at.date_naive(),
        })
        .collect()
}

pub fn build_team_report(
    directory: &TeamDirectory,
    feedback: &[FeedbackRecord],
    health: &[HealthCheckRecord],
) -> TeamReport {
    let dashboard = build_dashboard_report(directory.team_id, feedback, health);

    let summary = SummaryCards {
        total_feedback: dashboard.feedback_count,
        average_rating: dashboard.average_rating.map(metrics::round1),
        positive_share: metrics::positive_share(&dashboard.sentiment_distribution),
        team_health: metrics::overall_health(&dashboard.aggregated_health),
        active_members: directory.members.len(),
    };

    TeamReport {
        team_id: directory.team_id,
        team_name: directory.team_name.clone(),
        sentiment_bars: sentiment_bars(&dashboard.sentiment_distribution),
        health_radar: health_radar(&dashboard.aggregated_health),
        health_trend: metrics::health_trend(health),
        rating_trend: metrics::rating_trend(feedback),
        members: summarize_members(directory, feedback),
        recent_feedback: recent_feedback(feedback, RECENT_FEEDBACK_LIMIT),
        summary,
        dashboard,
    }
}

fn format_optional(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(value) => format!("{value:.1}{suffix}"),
        None => "N/A".to_string(),
    }
}

pub fn render_markdown(report: &TeamReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# PeerPulse Team Report");
    let _ = writeln!(output, "Generated for {}", report.team_name);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Total feedback: {}", report.summary.total_feedback);
    let _ = writeln!(
        output,
        "- Average rating: {}",
        format_optional(report.summary.average_rating, " / 5")
    );
    let _ = writeln!(
        output,
        "- Positive sentiment: {}",
        match report.summary.positive_share {
            Some(share) => format!("{share:.0}%"),
            None => "N/A".to_string(),
        }
    );
    let _ = writeln!(output, "- Team health: {:.1}%", report.summary.team_health);
    let _ = writeln!(output, "- Active members: {}", report.summary.active_members);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment");
    let untagged = report
        .dashboard
        .feedback_count
        .saturating_sub(report.dashboard.sentiment_distribution.total());
    for bar in &report.sentiment_bars {
        let _ = writeln!(output, "- {}: {}", bar.name, bar.value);
    }
    if untagged > 0 {
        let _ = writeln!(output, "- Untagged: {untagged}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Health");
    let health = &report.dashboard.aggregated_health;
    if health.sample_count == 0 {
        let _ = writeln!(output, "No health checks submitted for this window.");
    } else {
        let _ = writeln!(output, "Based on {} health checks.", health.sample_count);
        for point in &report.health_radar {
            let _ = writeln!(output, "- {}: {:.1}%", point.category, point.score);
        }
        if report.health_trend.len() > 1 {
            let _ = writeln!(output);
            let _ = writeln!(output, "### Weekly Trend");
            for point in &report.health_trend {
                let _ = writeln!(
                    output,
                    "- Week of {}: {:.1}% across {} checks",
                    point.week_start,
                    metrics::overall_health(&point.health),
                    point.health.sample_count
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Common Themes");
    if report.dashboard.top_themes.is_empty() {
        let _ = writeln!(output, "No feedback text recorded for this window.");
    } else {
        for theme in &report.dashboard.top_themes {
            let _ = writeln!(output, "- {} ({} mentions)", theme.word, theme.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Members");
    if report.members.is_empty() {
        let _ = writeln!(output, "No members on this team.");
    } else {
        for member in &report.members {
            let _ = writeln!(
                output,
                "- {}: {} feedback, average {}",
                member.display_name,
                member.feedback_count,
                format_optional(member.average_rating, "")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Feedback");
    if report.recent_feedback.is_empty() {
        let _ = writeln!(output, "No feedback recorded for this window.");
    } else {
        for entry in &report.recent_feedback {
            let tag = entry
                .sentiment
                .map(|tag| format!(" [{tag}]"))
                .unwrap_or_default();
            let _ = writeln!(
                output,
                "- {} ({}/5){}: {}",
                entry.date, entry.rating, tag, entry.content
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
    }

    fn feedback(
        team_id: Uuid,
        to_user_id: Uuid,
        rating: i32,
        content: &str,
        sentiment: Option<SentimentTag>,
        day: u32,
    ) -> FeedbackRecord {
        FeedbackRecord {
            id: Uuid::new_v4(),
            team_id,
            from_user_id: Uuid::new_v4(),
            to_user_id,
            rating,
            content: content.to_string(),
            sentiment,
            created_at: at(day),
        }
    }

    fn health(team_id: Uuid, score: i32, day: u32) -> HealthCheckRecord {
        HealthCheckRecord {
            id: Uuid::new_v4(),
            team_id,
            user_id: Uuid::new_v4(),
            motivation: score,
            collaboration: score,
            communication: score,
            workload: score,
            satisfaction: score,
            created_at: at(day),
        }
    }

    struct Fixture {
        directory: TeamDirectory,
        avery: Uuid,
        jules: Uuid,
        feedback: Vec<FeedbackRecord>,
        health: Vec<HealthCheckRecord>,
    }

    fn fixture() -> Fixture {
        let team_id = Uuid::new_v4();
        let avery = Uuid::new_v4();
        let jules = Uuid::new_v4();
        let kiara = Uuid::new_v4();
        let directory = TeamDirectory {
            team_id,
            team_name: "Capstone Alpha".to_string(),
            members: HashMap::from([
                (avery, "Avery Lee".to_string()),
                (jules, "Jules Moreno".to_string()),
                (kiara, "Kiara Patel".to_string()),
            ]),
        };
        let feedback = vec![
            feedback(
                team_id,
                avery,
                5,
                "Great communication skills and always helpful!",
                Some(SentimentTag::Positive),
                2,
            ),
            feedback(
                team_id,
                avery,
                4,
                "Shows strong leadership but could improve on time management.",
                Some(SentimentTag::Constructive),
                3,
            ),
            feedback(
                team_id,
                jules,
                3,
                "Sometimes late to meetings but contributes great ideas.",
                None,
                4,
            ),
        ];
        let health = vec![health(team_id, 8, 2), health(team_id, 6, 10)];
        Fixture {
            directory,
            avery,
            jules,
            feedback,
            health,
        }
    }

    #[test]
    fn dashboard_combines_all_aggregates() {
        let f = fixture();
        let report = build_dashboard_report(f.directory.team_id, &f.feedback, &f.health);

        assert_eq!(report.feedback_count, 3);
        assert_eq!(
            report.sentiment_distribution,
            SentimentDistribution {
                positive: 1,
                neutral: 0,
                constructive: 1
            }
        );
        assert_eq!(report.average_rating, Some(4.0));
        assert_eq!(report.aggregated_health.team_id, Some(f.directory.team_id));
        assert_eq!(report.aggregated_health.motivation, 70.0);
        assert_eq!(report.aggregated_health.sample_count, 2);
        assert_eq!(report.top_themes[0].word, "great");
        assert_eq!(report.top_themes[0].count, 2);
    }

    #[test]
    fn dashboard_tolerates_missing_data() {
        let team_id = Uuid::new_v4();
        let report = build_dashboard_report(team_id, &[], &[]);
        assert_eq!(report.feedback_count, 0);
        assert_eq!(report.sentiment_distribution, SentimentDistribution::default());
        assert_eq!(report.average_rating, None);
        assert_eq!(
            report.aggregated_health,
            AggregatedTeamHealth::empty(Some(team_id))
        );
        assert!(report.top_themes.is_empty());
    }

    #[test]
    fn dashboard_is_reproducible() {
        let f = fixture();
        let first = build_dashboard_report(f.directory.team_id, &f.feedback, &f.health);
        let second = build_dashboard_report(f.directory.team_id, &f.feedback, &f.health);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn dashboard_serializes_with_camel_case_keys() {
        let f = fixture();
        let report = build_dashboard_report(f.directory.team_id, &f.feedback, &[]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["feedbackCount"], 3);
        assert_eq!(value["sentimentDistribution"]["positive"], 1);
        assert_eq!(value["aggregatedHealth"]["sampleCount"], 0);
        assert!(value["topThemes"].is_array());

        let empty = build_dashboard_report(f.directory.team_id, &[], &[]);
        let value = serde_json::to_value(&empty).unwrap();
        assert!(value["averageRating"].is_null());
    }

    #[test]
    fn members_rank_by_feedback_received() {
        let f = fixture();
        let members = summarize_members(&f.directory, &f.feedback);
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].user_id, f.avery);
        assert_eq!(members[0].feedback_count, 2);
        assert_eq!(members[0].average_rating, Some(4.5));
        assert_eq!(members[1].user_id, f.jules);
        assert_eq!(members[2].display_name, "Kiara Patel");
        assert_eq!(members[2].average_rating, None);
    }

    #[test]
    fn feedback_for_outsiders_is_labelled() {
        let f = fixture();
        let stranger = feedback(f.directory.team_id, Uuid::new_v4(), 2, "", None, 5);
        let members = summarize_members(&f.directory, &[stranger]);
        assert_eq!(members[0].display_name, "Unknown member");
        assert_eq!(members[0].feedback_count, 1);
    }

    #[test]
    fn team_report_fills_widgets() {
        let f = fixture();
        let report = build_team_report(&f.directory, &f.feedback, &f.health);

        assert_eq!(report.team_name, "Capstone Alpha");
        assert_eq!(report.summary.total_feedback, 3);
        assert_eq!(report.summary.average_rating, Some(4.0));
        assert_eq!(report.summary.positive_share, Some(50.0));
        assert_eq!(report.summary.team_health, 70.0);
        assert_eq!(report.summary.active_members, 3);

        let bar_names: Vec<&str> = report.sentiment_bars.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(bar_names, vec!["Positive", "Neutral", "Constructive"]);

        assert_eq!(report.health_radar.len(), 4);
        assert!(report.health_radar.iter().all(|p| p.full_mark == 100.0));
        assert_eq!(report.health_trend.len(), 2);

        assert_eq!(report.rating_trend.len(), 3);
        assert_eq!(report.recent_feedback[0].rating, 3);
        assert_eq!(report.recent_feedback[2].rating_label.as_deref(), Some("Excellent"));
    }

    #[test]
    fn markdown_covers_every_section() {
        let f = fixture();
        let markdown = render_markdown(&build_team_report(&f.directory, &f.feedback, &f.health));

        assert!(markdown.starts_with("# PeerPulse Team Report\nGenerated for Capstone Alpha"));
        assert!(markdown.contains("- Average rating: 4.0 / 5"));
        assert!(markdown.contains("- Positive sentiment: 50%"));
        assert!(markdown.contains("- Untagged: 1"));
        assert!(markdown.contains("- Motivation: 70.0%"));
        assert!(markdown.contains("### Weekly Trend"));
        assert!(markdown.contains("- great (2 mentions)"));
        assert!(markdown.contains("- Avery Lee: 2 feedback, average 4.5"));
        assert!(markdown.contains("[positive]"));
    }

    #[test]
    fn markdown_handles_an_empty_team() {
        let directory = TeamDirectory {
            team_id: Uuid::new_v4(),
            team_name: "Fresh Team".to_string(),
            members: HashMap::new(),
        };
        let markdown = render_markdown(&build_team_report(&directory, &[], &[]));
        assert!(markdown.contains("- Average rating: N/A"));
        assert!(markdown.contains("- Positive sentiment: N/A"));
        assert!(markdown.contains("No health checks submitted for this window."));
        assert!(markdown.contains("No feedback text recorded for this window."));
        assert!(markdown.contains("No members on this team."));
    }

    proptest! {
        #[test]
        fn reports_are_deterministic(
            rows in prop::collection::vec((1i32..=5, "[a-z ]{0,40}", 1u32..=28), 0..20)
        ) {
            let team_id = Uuid::nil();
            let records: Vec<FeedbackRecord> = rows
                .iter()
                .map(|(rating, content, day)| {
                    feedback(team_id, Uuid::nil(), *rating, content, None, *day)
                })
                .collect();
            let first = build_dashboard_report(team_id, &records, &[]);
            let second = build_dashboard_report(team_id, &records, &[]);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.sentiment_distribution.total() <= records.len());
        }
    }
}
