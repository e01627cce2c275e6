use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::errors::{StoreError, SubmissionError};
use crate::models::{AttendanceRow, NewAttendanceEntry, Operator, SessionRecord, SessionSummary};
use crate::store::AttendanceStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn add_operator(pool: &PgPool, username: &str, password: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO roll_call.operators (username, password)
        VALUES ($1, $2)
        ON CONFLICT (username) DO UPDATE
        SET password = EXCLUDED.password
        "#,
    )
    .bind(username)
    .bind(password)
    .execute(pool)
    .await?;
    Ok(())
}

/// Postgres-backed store. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for PgStore {
    async fn commit_session(
        &self,
        remark: &str,
        entries: &[NewAttendanceEntry],
    ) -> Result<SessionRecord, SubmissionError> {
        let create = |e: sqlx::Error| SubmissionError::SessionCreate(e.into());
        let write = |e: sqlx::Error| SubmissionError::AttendanceWrite(e.into());

        let mut tx = self.pool.begin().await.map_err(create)?;

        let row = sqlx::query(
            r#"
            INSERT INTO roll_call.sessions (id, remark)
            VALUES ($1, $2)
            RETURNING id, created_at, remark
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(remark)
        .fetch_one(&mut *tx)
        .await
        .map_err(create)?;

        let session = SessionRecord {
            id: row.get("id"),
            created_at: row.get("created_at"),
            remark: row.get("remark"),
        };

        if !entries.is_empty() {
            let mut insert: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO roll_call.attendance_entries \
                 (session_id, student_id, student_name, attendance) ",
            );
            insert.push_values(entries, |mut b, entry| {
                b.push_bind(session.id)
                    .push_bind(entry.student_id.clone())
                    .push_bind(entry.student_name.clone())
                    .push_bind(entry.attendance);
            });
            insert.build().execute(&mut *tx).await.map_err(write)?;
        }

        tx.commit().await.map_err(write)?;
        Ok(session)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, created_at, remark FROM roll_call.sessions ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SessionRecord {
                id: row.get("id"),
                created_at: row.get("created_at"),
                remark: row.get("remark"),
            })
            .collect())
    }

    async fn fetch_entries(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AttendanceRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT session_id, student_id, student_name, attendance
            FROM roll_call.attendance_entries
            ORDER BY session_id, student_id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| AttendanceRow {
                session_id: row.get("session_id"),
                student_id: row.get("student_id"),
                student_name: row.get("student_name"),
                attendance: row.get("attendance"),
            })
            .collect())
    }

    async fn find_operator(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Operator>, StoreError> {
        let row = sqlx::query(
            "SELECT username FROM roll_call.operators WHERE username = $1 AND password = $2",
        )
        .bind(username)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Operator {
            username: row.get("username"),
        }))
    }

    async fn session_summaries(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.created_at, s.remark,
                   COUNT(*) FILTER (WHERE a.attendance = 1) AS present,
                   COUNT(*) FILTER (WHERE a.attendance = 0) AS absent,
                   COUNT(a.student_id) FILTER (WHERE a.attendance IS NULL) AS unmarked
            FROM roll_call.sessions s
            LEFT JOIN roll_call.attendance_entries a ON a.session_id = s.id
            GROUP BY s.id, s.created_at, s.remark
            ORDER BY s.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SessionSummary {
                session: SessionRecord {
                    id: row.get("id"),
                    created_at: row.get("created_at"),
                    remark: row.get("remark"),
                },
                present: row.get("present"),
                absent: row.get("absent"),
                unmarked: row.get("unmarked"),
            })
            .collect())
    }
}
