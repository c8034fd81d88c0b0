//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::auth_session::AuthSession;
use crate::domain::entity::subject::SubjectRef;
use crate::domain::repository::SessionRepository;
use crate::error::{AuthemError, AuthemResult};

/// PostgreSQL-backed session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionRepository for PgSessionRepository {
    async fn insert(&self, session: &AuthSession) -> AuthemResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO authem_sessions (
                role,
                subject_type,
                subject_id,
                token,
                client_token,
                ttl,
                expires_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&session.role)
        .bind(&session.subject.subject_type)
        .bind(session.subject.subject_id)
        .bind(&session.token)
        .bind(session.client_token.as_deref())
        .bind(session.ttl_secs)
        .bind(session.expires_at)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AuthemError::TokenCollision(session.role.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_active(
        &self,
        role: &str,
        token: &str,
        client_token: Option<&str>,
    ) -> AuthemResult<Option<AuthSession>> {
        let now = Utc::now();

        // Renew-on-use in a single statement; row-level atomicity covers
        // the read-then-renew step under concurrent lookups of one token.
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE authem_sessions
            SET expires_at = $4 + ttl * interval '1 second', updated_at = $4
            WHERE role = $1
              AND token = $2
              AND ($3::text IS NULL OR client_token = $3)
              AND expires_at > $4
            RETURNING
                role,
                subject_type,
                subject_id,
                token,
                client_token,
                ttl,
                expires_at,
                created_at,
                updated_at
            "#,
        )
        .bind(role)
        .bind(token)
        .bind(client_token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn delete_by_token(
        &self,
        role: &str,
        token: &str,
        client_token: Option<&str>,
    ) -> AuthemResult<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM authem_sessions
            WHERE role = $1
              AND token = $2
              AND ($3::text IS NULL OR client_token = $3)
            "#,
        )
        .bind(role)
        .bind(token)
        .bind(client_token)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    async fn delete_all_for_subject(
        &self,
        subject: &SubjectRef,
        role: Option<&str>,
    ) -> AuthemResult<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM authem_sessions
            WHERE subject_type = $1
              AND subject_id = $2
              AND ($3::text IS NULL OR role = $3)
            "#,
        )
        .bind(&subject.subject_type)
        .bind(subject.subject_id)
        .bind(role)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> AuthemResult<u64> {
        let deleted = sqlx::query("DELETE FROM authem_sessions WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

/// Database row mapping
#[derive(sqlx::FromRow)]
struct SessionRow {
    role: String,
    subject_type: String,
    subject_id: i64,
    token: String,
    client_token: Option<String>,
    ttl: i64,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            role: self.role,
            subject: SubjectRef {
                subject_type: self.subject_type,
                subject_id: self.subject_id,
            },
            token: self.token,
            client_token: self.client_token,
            ttl_secs: self.ttl,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
