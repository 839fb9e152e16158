use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::models::{FeedbackRecord, HealthCheckRecord, SentimentTag, TeamDirectory};
use crate::sentiment;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn ensure_team(conn: &mut PgConnection, name: &str) -> anyhow::Result<Uuid> {
    let team_id: Uuid = sqlx::query(
        r#"
        INSERT INTO peerpulse.teams (id, name, invite_code)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(invite_code())
    .fetch_one(&mut *conn)
    .await?
    .get("id");

    Ok(team_id)
}

fn invite_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

async fn ensure_member(
    conn: &mut PgConnection,
    team_id: Uuid,
    email: &str,
    name: Option<&str>,
) -> anyhow::Result<Uuid> {
    let fallback_name = email.split('@').next().unwrap_or(email);
    let user_id: Uuid = sqlx::query(
        r#"
        INSERT INTO peerpulse.users (id, email, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET name = COALESCE($4, peerpulse.users.name)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name.unwrap_or(fallback_name))
    .bind(name)
    .fetch_one(&mut *conn)
    .await?
    .get("id");

    sqlx::query(
        r#"
        INSERT INTO peerpulse.team_members (id, team_id, user_id, role)
        VALUES ($1, $2, $3, 'member')
        ON CONFLICT (team_id, user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(team_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(user_id)
}

async fn insert_feedback(
    conn: &mut PgConnection,
    record: &FeedbackRecord,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO peerpulse.feedback
        (id, team_id, from_user_id, to_user_id, rating, content, sentiment, created_at, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(record.id)
    .bind(record.team_id)
    .bind(record.from_user_id)
    .bind(record.to_user_id)
    .bind(record.rating)
    .bind(&record.content)
    .bind(record.sentiment.map(|tag| tag.as_str()))
    .bind(record.created_at)
    .bind(source_key)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_health_check(
    conn: &mut PgConnection,
    record: &HealthCheckRecord,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO peerpulse.team_health_checks
        (id, team_id, user_id, motivation, collaboration, communication, workload,
         satisfaction, created_at, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(record.id)
    .bind(record.team_id)
    .bind(record.user_id)
    .bind(record.motivation)
    .bind(record.collaboration)
    .bind(record.communication)
    .bind(record.workload)
    .bind(record.satisfaction)
    .bind(record.created_at)
    .bind(source_key)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn seed_time(month: u32, day: u32) -> anyhow::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2026, month, day, 15, 0, 0)
        .single()
        .context("invalid seed timestamp")
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    let team_id = ensure_team(&mut tx, "Capstone Alpha").await?;

    let members = [
        ("avery.lee@peerpulse.dev", "Avery Lee"),
        ("jules.moreno@peerpulse.dev", "Jules Moreno"),
        ("kiara.patel@peerpulse.dev", "Kiara Patel"),
    ];
    let mut ids = Vec::new();
    for (email, name) in members {
        ids.push(ensure_member(&mut tx, team_id, email, Some(name)).await?);
    }

    let feedback: [(&str, usize, usize, i32, &str, Option<SentimentTag>, (u32, u32)); 6] = [
        (
            "seed-fb-001",
            1,
            0,
            5,
            "Great communication skills and always helpful!",
            Some(SentimentTag::Positive),
            (2, 23),
        ),
        (
            "seed-fb-002",
            2,
            0,
            4,
            "Shows strong leadership but could improve on time management.",
            Some(SentimentTag::Constructive),
            (2, 24),
        ),
        (
            "seed-fb-003",
            0,
            1,
            5,
            "Excellent problem-solving abilities and team collaboration.",
            Some(SentimentTag::Positive),
            (2, 25),
        ),
        (
            "seed-fb-004",
            2,
            1,
            3,
            "Sometimes late to meetings but contributes great ideas.",
            None,
            (3, 2),
        ),
        (
            "seed-fb-005",
            0,
            2,
            5,
            "Very organized and detail-oriented work.",
            Some(SentimentTag::Neutral),
            (3, 3),
        ),
        (
            "seed-fb-006",
            1,
            2,
            3,
            "Could be more proactive in team discussions.",
            Some(SentimentTag::Constructive),
            (3, 4),
        ),
    ];

    for (source_key, from, to, rating, content, tag, (month, day)) in feedback {
        let record = FeedbackRecord {
            id: Uuid::new_v4(),
            team_id,
            from_user_id: ids[from],
            to_user_id: ids[to],
            rating,
            content: content.to_string(),
            sentiment: tag,
            created_at: seed_time(month, day)?,
        };
        insert_feedback(&mut tx, &record, source_key).await?;
    }

    let checks: [(&str, usize, [i32; 5], (u32, u32)); 6] = [
        ("seed-hc-001", 0, [8, 7, 9, 6, 8], (2, 23)),
        ("seed-hc-002", 1, [9, 8, 9, 7, 8], (2, 24)),
        ("seed-hc-003", 2, [8, 8, 10, 6, 8], (2, 25)),
        ("seed-hc-004", 0, [9, 9, 9, 7, 9], (3, 2)),
        ("seed-hc-005", 1, [8, 9, 10, 7, 9], (3, 3)),
        ("seed-hc-006", 2, [9, 8, 9, 8, 8], (3, 4)),
    ];

    for (source_key, member, scores, (month, day)) in checks {
        let record = HealthCheckRecord {
            id: Uuid::new_v4(),
            team_id,
            user_id: ids[member],
            motivation: scores[0],
            collaboration: scores[1],
            communication: scores[2],
            workload: scores[3],
            satisfaction: scores[4],
            created_at: seed_time(month, day)?,
        };
        insert_health_check(&mut tx, &record, source_key).await?;
    }

    tx.commit().await?;
    tracing::info!(%team_id, "seeded demo team");
    Ok(())
}

pub async fn fetch_team_directory(
    pool: &PgPool,
    team_name: &str,
) -> anyhow::Result<TeamDirectory> {
    let team_id: Uuid = sqlx::query("SELECT id FROM peerpulse.teams WHERE name = $1")
        .bind(team_name)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("team {team_name:?} not found"))?
        .get("id");

    let rows = sqlx::query(
        "SELECT u.id, u.name \
         FROM peerpulse.team_members tm \
         JOIN peerpulse.users u ON u.id = tm.user_id \
         WHERE tm.team_id = $1",
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    let members: HashMap<Uuid, String> = rows
        .into_iter()
        .map(|row| (row.get("id"), row.get("name")))
        .collect();

    tracing::debug!(%team_id, members = members.len(), "loaded team directory");

    Ok(TeamDirectory {
        team_id,
        team_name: team_name.to_string(),
        members,
    })
}

fn feedback_from_row(row: &PgRow) -> FeedbackRecord {
    let content: Option<String> = row.get("content");
    let stored_tag: Option<String> = row.get("sentiment");
    FeedbackRecord {
        id: row.get("id"),
        team_id: row.get("team_id"),
        from_user_id: row.get("from_user_id"),
        to_user_id: row.get("to_user_id"),
        rating: row.get("rating"),
        content: content.unwrap_or_default(),
        sentiment: SentimentTag::parse_stored(stored_tag.as_deref()),
        created_at: row.get("created_at"),
    }
}

pub async fn fetch_feedback(
    pool: &PgPool,
    team_id: Uuid,
    since: Option<DateTime<Utc>>,
) -> anyhow::Result<Vec<FeedbackRecord>> {
    let mut query = String::from(
        "SELECT id, team_id, from_user_id, to_user_id, rating, content, sentiment, created_at \
         FROM peerpulse.feedback \
         WHERE team_id = $1",
    );
    if since.is_some() {
        query.push_str(" AND created_at >= $2");
    }
    query.push_str(" ORDER BY created_at, id");

    let mut rows = sqlx::query(&query).bind(team_id);
    if let Some(value) = since {
        rows = rows.bind(value);
    }

    let records: Vec<FeedbackRecord> = rows
        .fetch_all(pool)
        .await?
        .iter()
        .map(feedback_from_row)
        .collect();

    tracing::debug!(%team_id, count = records.len(), "fetched feedback");
    Ok(records)
}

pub async fn fetch_health_checks(
    pool: &PgPool,
    team_id: Uuid,
    since: Option<DateTime<Utc>>,
) -> anyhow::Result<Vec<HealthCheckRecord>> {
    let mut query = String::from(
        "SELECT id, team_id, user_id, motivation, collaboration, communication, workload, \
         satisfaction, created_at \
         FROM peerpulse.team_health_checks \
         WHERE team_id = $1",
    );
    if since.is_some() {
        query.push_str(" AND created_at >= $2");
    }
    query.push_str(" ORDER BY created_at, id");

    let mut rows = sqlx::query(&query).bind(team_id);
    if let Some(value) = since {
        rows = rows.bind(value);
    }

    let records: Vec<HealthCheckRecord> = rows
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| HealthCheckRecord {
            id: row.get("id"),
            team_id: row.get("team_id"),
            user_id: row.get("user_id"),
            motivation: row.get("motivation"),
            collaboration: row.get("collaboration"),
            communication: row.get("communication"),
            workload: row.get("workload"),
            satisfaction: row.get("satisfaction"),
            created_at: row.get("created_at"),
        })
        .collect();

    tracing::debug!(%team_id, count = records.len(), "fetched health checks");
    Ok(records)
}

#[derive(Debug, serde::Deserialize)]
struct FeedbackCsvRow {
    team: String,
    from_email: String,
    to_email: String,
    to_name: Option<String>,
    rating: i32,
    content: String,
    sentiment: Option<String>,
    created_at: DateTime<Utc>,
    source_key: Option<String>,
}

/// A validated feedback row whose team and user ids are not resolved yet.
#[derive(Debug)]
struct PendingFeedback {
    team: String,
    from_email: String,
    to_email: String,
    to_name: Option<String>,
    record: FeedbackRecord,
    source_key: Option<String>,
}

/// Parses and validates every row up front, so a bad line rejects the file before any write.
fn read_feedback_rows<R: std::io::Read>(
    source: R,
    suggest_sentiment: bool,
) -> anyhow::Result<Vec<PendingFeedback>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut pending = Vec::new();

    for (index, result) in reader.deserialize::<FeedbackCsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed feedback row at line {line}"))?;

        let mut tag = SentimentTag::parse_stored(row.sentiment.as_deref());
        if tag.is_none() && suggest_sentiment {
            tag = Some(sentiment::suggest_tag(&row.content));
        }

        let record = FeedbackRecord {
            id: Uuid::new_v4(),
            team_id: Uuid::nil(),
            from_user_id: Uuid::nil(),
            to_user_id: Uuid::nil(),
            rating: row.rating,
            content: row.content,
            sentiment: tag,
            created_at: row.created_at,
        };
        record
            .validate()
            .with_context(|| format!("invalid feedback row at line {line}"))?;

        pending.push(PendingFeedback {
            team: row.team,
            from_email: row.from_email,
            to_email: row.to_email,
            to_name: row.to_name,
            record,
            source_key: row.source_key,
        });
    }

    Ok(pending)
}

/// Imports feedback rows in one transaction. With `suggest_sentiment`, untagged rows get the
/// classifier's suggestion the way the submission form pre-selects one.
pub async fn import_feedback_csv(
    pool: &PgPool,
    csv_path: &Path,
    suggest_sentiment: bool,
) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = read_feedback_rows(file, suggest_sentiment)?;

    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for row in rows {
        let mut record = row.record;
        record.team_id = ensure_team(&mut tx, &row.team).await?;
        record.from_user_id =
            ensure_member(&mut tx, record.team_id, &row.from_email, None).await?;
        record.to_user_id =
            ensure_member(&mut tx, record.team_id, &row.to_email, row.to_name.as_deref()).await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_feedback(&mut tx, &record, &source_key).await? {
            inserted += 1;
        } else {
            tracing::debug!(%source_key, "feedback already imported");
        }
    }

    tx.commit().await?;
    tracing::info!(inserted, path = %csv_path.display(), "imported feedback");
    Ok(inserted)
}

#[derive(Debug, serde::Deserialize)]
struct HealthCsvRow {
    team: String,
    email: String,
    name: Option<String>,
    motivation: i32,
    collaboration: i32,
    communication: i32,
    workload: i32,
    satisfaction: i32,
    created_at: DateTime<Utc>,
    source_key: Option<String>,
}

#[derive(Debug)]
struct PendingHealthCheck {
    team: String,
    email: String,
    name: Option<String>,
    record: HealthCheckRecord,
    source_key: Option<String>,
}

fn read_health_rows<R: std::io::Read>(source: R) -> anyhow::Result<Vec<PendingHealthCheck>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut pending = Vec::new();

    for (index, result) in reader.deserialize::<HealthCsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed health row at line {line}"))?;

        let record = HealthCheckRecord {
            id: Uuid::new_v4(),
            team_id: Uuid::nil(),
            user_id: Uuid::nil(),
            motivation: row.motivation,
            collaboration: row.collaboration,
            communication: row.communication,
            workload: row.workload,
            satisfaction: row.satisfaction,
            created_at: row.created_at,
        };
        record
            .validate()
            .with_context(|| format!("invalid health row at line {line}"))?;

        pending.push(PendingHealthCheck {
            team: row.team,
            email: row.email,
            name: row.name,
            record,
            source_key: row.source_key,
        });
    }

    Ok(pending)
}

pub async fn import_health_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = read_health_rows(file)?;

    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for row in rows {
        let mut record = row.record;
        record.team_id = ensure_team(&mut tx, &row.team).await?;
        record.user_id =
            ensure_member(&mut tx, record.team_id, &row.email, row.name.as_deref()).await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_health_check(&mut tx, &record, &source_key).await? {
            inserted += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(inserted, path = %csv_path.display(), "imported health checks");
    Ok(inserted)
}
