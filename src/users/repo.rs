use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ApprovalStatus, NewUser, User, UserFilter, UserRow, UserStatusUpdate};
use crate::{db::contains_pattern, pagination::Paging};

const USER_COLUMNS: &str = "id, email, password_hash, display_name, approval_status, \
     account_status, govt_id_url, is_admin, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    /// Another row already holds this email (also the concurrent-insert race).
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

fn map_insert_error(err: sqlx::Error) -> CreateUserError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => CreateUserError::DuplicateEmail,
        _ => CreateUserError::Store(anyhow::Error::new(err).context("insert user")),
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create(&self, new: NewUser) -> Result<User, CreateUserError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool>;
    async fn update_display_name(&self, id: Uuid, display_name: &str)
        -> anyhow::Result<Option<User>>;
    /// Moves the user to `to` only if the current status is one of `from`.
    /// Returns `None` when the user is missing or in another state.
    async fn transition_approval(
        &self,
        id: Uuid,
        from: &[ApprovalStatus],
        to: ApprovalStatus,
        govt_id_url: Option<String>,
    ) -> anyhow::Result<Option<User>>;
    async fn update_status(&self, id: Uuid, update: UserStatusUpdate)
        -> anyhow::Result<Option<User>>;
    async fn search(&self, filter: &UserFilter, paging: Paging) -> anyhow::Result<(Vec<User>, i64)>;
    /// `(approval_status, count)` pairs over all users.
    async fn count_by_approval(&self) -> anyhow::Result<Vec<(String, i64)>>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_user_conditions(filter: &UserFilter, qb: &mut QueryBuilder<'_, Postgres>) {
    qb.push(" WHERE TRUE");
    if let Some(term) = filter.search_term() {
        let pattern = contains_pattern(&term);
        qb.push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR display_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = &filter.status {
        qb.push(" AND approval_status = ")
            .push_bind(status.as_str().to_string());
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .context("find user by email")?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        Ok(row.map(User::from))
    }

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, display_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.display_name)
            .fetch_one(&self.db)
            .await
            .map_err(map_insert_error)?;
        Ok(row.into())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1"#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.db)
        .await
        .context("update password hash")?;
        Ok(res.rows_affected() == 1)
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: &str,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET display_name = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(display_name)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.db)
            .await
            .context("update display name")?;
        Ok(row.map(User::from))
    }

    async fn transition_approval(
        &self,
        id: Uuid,
        from: &[ApprovalStatus],
        to: ApprovalStatus,
        govt_id_url: Option<String>,
    ) -> anyhow::Result<Option<User>> {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            r#"
            UPDATE users
               SET approval_status = $3,
                   govt_id_url = COALESCE($4, govt_id_url),
                   updated_at = $5
             WHERE id = $1 AND approval_status = ANY($2)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(from)
            .bind(to.as_str())
            .bind(govt_id_url)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.db)
            .await
            .context("transition approval status")?;
        Ok(row.map(User::from))
    }

    async fn update_status(
        &self,
        id: Uuid,
        update: UserStatusUpdate,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET is_admin = COALESCE($2, is_admin),
                   approval_status = COALESCE($3, approval_status),
                   account_status = COALESCE($4, account_status),
                   updated_at = $5
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(update.is_admin)
            .bind(update.approval_status.as_ref().map(|s| s.as_str().to_string()))
            .bind(update.account_status.map(|s| s.as_str()))
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.db)
            .await
            .context("update user status")?;
        Ok(row.map(User::from))
    }

    async fn search(&self, filter: &UserFilter, paging: Paging) -> anyhow::Result<(Vec<User>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_user_conditions(filter, &mut count);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .context("count users")?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_user_conditions(filter, &mut select);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(paging.limit)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows = select
            .build_query_as::<UserRow>()
            .fetch_all(&self.db)
            .await
            .context("search users")?;
        Ok((rows.into_iter().map(User::from).collect(), total))
    }

    async fn count_by_approval(&self) -> anyhow::Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"SELECT approval_status, COUNT(*) FROM users GROUP BY approval_status"#,
        )
        .fetch_all(&self.db)
        .await
        .context("count users by approval status")?;
        Ok(rows)
    }
}
