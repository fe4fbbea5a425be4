use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::types::{DedupKey, JobPage, JobPosting, JobRecord, JobType, ListQuery};

const RECORD_COLUMNS: &str =
    "id, title, company, location, posting_date, job_type, tags, created_at, updated_at";

fn posting_from_row(row: &PgRow) -> sqlx::Result<JobPosting> {
    let job_type: String = row.try_get("job_type")?;
    let job_type = job_type
        .parse::<JobType>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(JobPosting {
        title: row.try_get("title")?,
        company: row.try_get("company")?,
        location: row.try_get("location")?,
        posting_date: row.try_get::<NaiveDate, _>("posting_date")?,
        job_type,
        tags: row.try_get::<Vec<String>, _>("tags")?,
    })
}

fn record_from_row(row: &PgRow) -> sqlx::Result<JobRecord> {
    Ok(JobRecord {
        id: row.try_get("id")?,
        posting: posting_from_row(row)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn find_by_key(pool: &PgPool, key: &DedupKey) -> sqlx::Result<Option<JobPosting>> {
    let row = sqlx::query(
        r#"
        SELECT title, company, location, posting_date, job_type, tags
        FROM jobs.posting
        WHERE title = $1 AND company = $2 AND posting_date = $3
        "#,
    )
    .bind(&key.title)
    .bind(&key.company)
    .bind(key.posting_date)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(posting_from_row).transpose()
}

/// Set-or-replace on the dedup key; every non-key field is overwritten.
/// Returns true when a new row was inserted.
pub async fn upsert_posting(pool: &PgPool, p: &JobPosting) -> sqlx::Result<bool> {
    let row = sqlx::query(
        r#"
        INSERT INTO jobs.posting (title, company, location, posting_date, job_type, tags)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (title, company, posting_date) DO UPDATE
          SET location   = EXCLUDED.location,
              job_type   = EXCLUDED.job_type,
              tags       = EXCLUDED.tags,
              updated_at = now()
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&p.title)
    .bind(&p.company)
    .bind(&p.location)
    .bind(p.posting_date)
    .bind(p.job_type.as_str())
    .bind(&p.tags)
    .fetch_one(pool)
    .await?;
    row.try_get::<bool, _>("inserted")
}

pub async fn insert_job(pool: &PgPool, p: &JobPosting) -> sqlx::Result<JobRecord> {
    let sql = format!(
        r#"
        INSERT INTO jobs.posting (title, company, location, posting_date, job_type, tags)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {RECORD_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(&p.title)
        .bind(&p.company)
        .bind(&p.location)
        .bind(p.posting_date)
        .bind(p.job_type.as_str())
        .bind(&p.tags)
        .fetch_one(pool)
        .await?;
    record_from_row(&row)
}

pub async fn get_job(pool: &PgPool, id: i64) -> sqlx::Result<Option<JobRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM jobs.posting WHERE id = $1");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(record_from_row).transpose()
}

/// Full replacement of a row addressed by id (callers merge patches first).
pub async fn replace_job(pool: &PgPool, id: i64, p: &JobPosting) -> sqlx::Result<Option<JobRecord>> {
    let sql = format!(
        r#"
        UPDATE jobs.posting
        SET title = $2, company = $3, location = $4, posting_date = $5,
            job_type = $6, tags = $7, updated_at = now()
        WHERE id = $1
        RETURNING {RECORD_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(&p.title)
        .bind(&p.company)
        .bind(&p.location)
        .bind(p.posting_date)
        .bind(p.job_type.as_str())
        .bind(&p.tags)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(record_from_row).transpose()
}

pub async fn delete_job(pool: &PgPool, id: i64) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM jobs.posting WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() == 1)
}

// LIKE metacharacters in user input match literally
fn like_pattern(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, q: &'a ListQuery) {
    qb.push(" WHERE TRUE");
    if let Some(t) = q.job_type {
        qb.push(" AND job_type = ").push_bind(t.as_str());
    }
    if let Some(loc) = &q.location {
        qb.push(" AND location ILIKE ").push_bind(like_pattern(loc));
    }
    if !q.tags.is_empty() {
        qb.push(" AND tags @> ").push_bind(&q.tags);
    }
    if let Some(term) = &q.q {
        let pat = like_pattern(term);
        qb.push(" AND (title ILIKE ").push_bind(pat.clone());
        qb.push(" OR company ILIKE ").push_bind(pat).push(")");
    }
}

pub async fn list_jobs(pool: &PgPool, q: &ListQuery) -> sqlx::Result<JobPage> {
    let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT count(*) AS total FROM jobs.posting");
    push_filters(&mut count_qb, q);
    let total: i64 = count_qb.build().fetch_one(pool).await?.try_get("total")?;

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {RECORD_COLUMNS} FROM jobs.posting"));
    push_filters(&mut qb, q);
    qb.push(" ORDER BY ").push(q.sort.order_by());
    qb.push(" LIMIT ").push_bind(q.limit);
    qb.push(" OFFSET ").push_bind(q.offset());
    let rows = qb.build().fetch_all(pool).await?;
    let data = rows.iter().map(record_from_row).collect::<sqlx::Result<Vec<_>>>()?;
    Ok(JobPage::new(data, q, total))
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::SortKey;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("London"), "%London%");
        assert_eq!(like_pattern("100%_x"), "%100\\%\\_x%");
    }

    #[test]
    fn filters_render_in_order() {
        let q = ListQuery {
            job_type: Some(JobType::Contract),
            location: Some("uk".into()),
            tags: vec!["Pricing".into()],
            q: Some("acme".into()),
            sort: SortKey::TitleAsc,
            ..ListQuery::default()
        };
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM jobs.posting");
        push_filters(&mut qb, &q);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM jobs.posting WHERE TRUE AND job_type = $1 AND location ILIKE $2 AND tags @> $3 AND (title ILIKE $4 OR company ILIKE $5)"
        );
    }

    #[test]
    fn no_filters_is_where_true() {
        let q = ListQuery::default();
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM jobs.posting");
        push_filters(&mut qb, &q);
        assert_eq!(qb.sql(), "SELECT 1 FROM jobs.posting WHERE TRUE");
    }
}
