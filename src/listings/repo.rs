use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    filter::{ListingFilter, ListingPage},
    repo_types::{Listing, ListingRow, ListingStats},
};

const LISTING_COLUMNS: &str = "id, title, price, address_line1, address_line2, city_town, \
     upazila, district, postal_code, property_type, mode, bedrooms, bathrooms, area, parking, \
     garden, air_conditioning, furnished, pool, description, images, is_hidden, is_featured, \
     created_by, creator_email, created_at, updated_at";

#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert(&self, listing: &Listing) -> anyhow::Result<()>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Listing>>;
    /// Listings for `ids`, in the order given; unknown ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Listing>>;
    /// Overwrites every mutable column. Returns `false` if the row is gone.
    async fn update(&self, listing: &Listing) -> anyhow::Result<bool>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn search(
        &self,
        filter: &ListingFilter,
        page: &ListingPage,
    ) -> anyhow::Result<(Vec<Listing>, i64)>;
    async fn set_hidden(&self, id: Uuid, hidden: bool) -> anyhow::Result<Option<Listing>>;
    async fn set_featured(&self, id: Uuid, featured: bool) -> anyhow::Result<Option<Listing>>;
    async fn stats(&self) -> anyhow::Result<ListingStats>;
}

pub struct PgListingStore {
    db: PgPool,
}

impl PgListingStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn set_flag(
        &self,
        column: &'static str,
        id: Uuid,
        value: bool,
    ) -> anyhow::Result<Option<Listing>> {
        let sql = format!(
            "UPDATE listings SET {column} = $2, updated_at = $3 WHERE id = $1 RETURNING {LISTING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id)
            .bind(value)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("set {column} on listing {id}"))?;
        row.map(Listing::try_from).transpose()
    }
}

fn rows_to_listings(rows: Vec<ListingRow>) -> anyhow::Result<Vec<Listing>> {
    rows.into_iter().map(Listing::try_from).collect()
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn insert(&self, l: &Listing) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO listings (
                id, title, price, address_line1, address_line2, city_town, upazila, district,
                postal_code, property_type, mode, bedrooms, bathrooms, area, parking, garden,
                air_conditioning, furnished, pool, description, images, is_hidden, is_featured,
                created_by, creator_email, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
            "#,
        )
        .bind(l.id)
        .bind(&l.title)
        .bind(l.price)
        .bind(&l.address_line1)
        .bind(&l.address_line2)
        .bind(&l.city_town)
        .bind(&l.upazila)
        .bind(&l.district)
        .bind(&l.postal_code)
        .bind(l.property_type.as_str())
        .bind(l.mode.as_str())
        .bind(l.bedrooms)
        .bind(l.bathrooms)
        .bind(l.area)
        .bind(l.features.parking)
        .bind(l.features.garden)
        .bind(l.features.air_conditioning)
        .bind(l.features.furnished.as_str())
        .bind(l.features.pool)
        .bind(&l.description)
        .bind(&l.images)
        .bind(l.is_hidden)
        .bind(l.is_featured)
        .bind(l.created_by)
        .bind(&l.creator_email)
        .bind(l.created_at)
        .bind(l.updated_at)
        .execute(&self.db)
        .await
        .context("insert listing")?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Listing>> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1");
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find listing")?;
        row.map(Listing::try_from).transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Listing>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
              FROM listings
              JOIN unnest($1::uuid[]) WITH ORDINALITY AS wanted(id, pos) USING (id)
             ORDER BY wanted.pos
            "#
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(ids)
            .fetch_all(&self.db)
            .await
            .context("find listings by ids")?;
        rows_to_listings(rows)
    }

    async fn update(&self, l: &Listing) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE listings
               SET title = $2, price = $3, address_line1 = $4, address_line2 = $5,
                   city_town = $6, upazila = $7, district = $8, postal_code = $9,
                   property_type = $10, mode = $11, bedrooms = $12, bathrooms = $13,
                   area = $14, parking = $15, garden = $16, air_conditioning = $17,
                   furnished = $18, pool = $19, description = $20, images = $21,
                   updated_at = $22
             WHERE id = $1
            "#,
        )
        .bind(l.id)
        .bind(&l.title)
        .bind(l.price)
        .bind(&l.address_line1)
        .bind(&l.address_line2)
        .bind(&l.city_town)
        .bind(&l.upazila)
        .bind(&l.district)
        .bind(&l.postal_code)
        .bind(l.property_type.as_str())
        .bind(l.mode.as_str())
        .bind(l.bedrooms)
        .bind(l.bathrooms)
        .bind(l.area)
        .bind(l.features.parking)
        .bind(l.features.garden)
        .bind(l.features.air_conditioning)
        .bind(l.features.furnished.as_str())
        .bind(l.features.pool)
        .bind(&l.description)
        .bind(&l.images)
        .bind(l.updated_at)
        .execute(&self.db)
        .await
        .context("update listing")?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM listings WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete listing {id}"))?;
        Ok(res.rows_affected() == 1)
    }

    async fn search(
        &self,
        filter: &ListingFilter,
        page: &ListingPage,
    ) -> anyhow::Result<(Vec<Listing>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM listings");
        filter.push_conditions(&mut count);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .context("count listings")?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {LISTING_COLUMNS} FROM listings"));
        filter.push_conditions(&mut select);
        select
            .push(page.order_by_sql())
            .push(" LIMIT ")
            .push_bind(page.paging.limit)
            .push(" OFFSET ")
            .push_bind(page.paging.offset());
        let rows = select
            .build_query_as::<ListingRow>()
            .fetch_all(&self.db)
            .await
            .context("search listings")?;
        Ok((rows_to_listings(rows)?, total))
    }

    async fn set_hidden(&self, id: Uuid, hidden: bool) -> anyhow::Result<Option<Listing>> {
        self.set_flag("is_hidden", id, hidden).await
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> anyhow::Result<Option<Listing>> {
        self.set_flag("is_featured", id, featured).await
    }

    async fn stats(&self) -> anyhow::Result<ListingStats> {
        let stats = sqlx::query_as::<_, ListingStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_hidden) AS hidden,
                   COUNT(*) FILTER (WHERE is_featured) AS featured
              FROM listings
            "#,
        )
        .fetch_one(&self.db)
        .await
        .context("listing stats")?;
        Ok(stats)
    }
}
