use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Returns `false` when the listing was already saved.
    async fn add(&self, user_id: Uuid, listing_id: Uuid) -> anyhow::Result<bool>;
    async fn remove(&self, user_id: Uuid, listing_id: Uuid) -> anyhow::Result<bool>;
    /// Saved listing ids, oldest first.
    async fn list_ids(&self, user_id: Uuid) -> anyhow::Result<Vec<Uuid>>;
}

pub struct PgWishlistStore {
    db: PgPool,
}

impl PgWishlistStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WishlistStore for PgWishlistStore {
    async fn add(&self, user_id: Uuid, listing_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO wishlist_items (user_id, listing_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, listing_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.db)
        .await
        .context("add wishlist item")?;
        Ok(res.rows_affected() == 1)
    }

    async fn remove(&self, user_id: Uuid, listing_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"DELETE FROM wishlist_items WHERE user_id = $1 AND listing_id = $2"#,
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.db)
        .await
        .context("remove wishlist item")?;
        Ok(res.rows_affected() == 1)
    }

    async fn list_ids(&self, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT listing_id
              FROM wishlist_items
             WHERE user_id = $1
             ORDER BY added_at, listing_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list wishlist")?;
        Ok(ids)
    }
}
