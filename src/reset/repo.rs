use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::debug;

use super::code::{CodeCheck, CodeState, CodeStep, ResetCode};

#[async_trait]
pub trait ResetCodeStore: Send + Sync {
    /// Stores a fresh code for `email`, replacing any previous one, and
    /// drops every code that expired before `now`.
    async fn issue(
        &self,
        email: &str,
        digest: &str,
        expires_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> anyhow::Result<()>;

    /// Presents a code digest for `email`. The read, the state transition
    /// and the write-back happen atomically per email, so two concurrent
    /// redeems of the same code cannot both be accepted. Expired codes and
    /// successfully redeemed ones are removed.
    async fn attempt(
        &self,
        email: &str,
        digest: &str,
        now: OffsetDateTime,
        step: CodeStep,
        max_attempts: i32,
    ) -> anyhow::Result<CodeCheck>;
}

#[derive(Debug, FromRow)]
struct ResetCodeRow {
    email: String,
    code_digest: String,
    expires_at: OffsetDateTime,
    attempts: i32,
    state: String,
}

impl TryFrom<ResetCodeRow> for ResetCode {
    type Error = anyhow::Error;

    fn try_from(r: ResetCodeRow) -> Result<Self, Self::Error> {
        let state =
            CodeState::parse(&r.state).ok_or_else(|| anyhow!("unknown reset code state {}", r.state))?;
        Ok(Self {
            email: r.email,
            digest: r.code_digest,
            expires_at: r.expires_at,
            attempts: r.attempts,
            state,
        })
    }
}

/// Whether the row is gone after this outcome: expired, or redeemed.
pub fn discards_code(step: CodeStep, outcome: &CodeCheck) -> bool {
    match outcome {
        CodeCheck::Expired => true,
        CodeCheck::Accepted => step == CodeStep::Redeem,
        _ => false,
    }
}

pub struct PgResetCodeStore {
    db: PgPool,
}

impl PgResetCodeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResetCodeStore for PgResetCodeStore {
    async fn issue(
        &self,
        email: &str,
        digest: &str,
        expires_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let purged = sqlx::query(r#"DELETE FROM password_reset_codes WHERE expires_at <= $1"#)
            .bind(now)
            .execute(&self.db)
            .await
            .context("purge expired reset codes")?
            .rows_affected();
        if purged > 0 {
            debug!(purged, "expired reset codes removed");
        }

        sqlx::query(
            r#"
            INSERT INTO password_reset_codes (email, code_digest, expires_at, attempts, state)
            VALUES ($1, $2, $3, 0, 'awaiting_code')
            ON CONFLICT (email) DO UPDATE
               SET code_digest = EXCLUDED.code_digest,
                   expires_at = EXCLUDED.expires_at,
                   attempts = 0,
                   state = 'awaiting_code',
                   updated_at = now()
            "#,
        )
        .bind(email)
        .bind(digest)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("issue reset code")?;
        Ok(())
    }

    async fn attempt(
        &self,
        email: &str,
        digest: &str,
        now: OffsetDateTime,
        step: CodeStep,
        max_attempts: i32,
    ) -> anyhow::Result<CodeCheck> {
        let mut tx = self.db.begin().await.context("begin reset code tx")?;

        let row = sqlx::query_as::<_, ResetCodeRow>(
            r#"
            SELECT email, code_digest, expires_at, attempts, state
              FROM password_reset_codes
             WHERE email = $1
               FOR UPDATE
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await
        .context("lock reset code")?;

        let Some(row) = row else {
            return Ok(CodeCheck::Missing);
        };
        let mut code = ResetCode::try_from(row)?;
        let outcome = code.attempt(digest, now, step, max_attempts);

        if discards_code(step, &outcome) {
            sqlx::query(r#"DELETE FROM password_reset_codes WHERE email = $1"#)
                .bind(email)
                .execute(&mut *tx)
                .await
                .context("drop reset code")?;
        } else {
            sqlx::query(
                r#"
                UPDATE password_reset_codes
                   SET attempts = $2, state = $3, updated_at = now()
                 WHERE email = $1
                "#,
            )
            .bind(email)
            .bind(code.attempts)
            .bind(code.state.as_str())
            .execute(&mut *tx)
            .await
            .context("update reset code")?;
        }

        tx.commit().await.context("commit reset code tx")?;
        Ok(outcome)
    }
}
