//! Listing search used by both the public browse endpoint and admin
//! moderation.
//!
//! A [`ListingFilter`] is a conjunction of optional constraints; an absent
//! field never restricts the result. The same filter renders into a SQL
//! `WHERE` clause for Postgres and into an in-process predicate, and both
//! must agree.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{Listing, ListingMode, PropertyType};
use crate::{db::contains_pattern, error::AppError, pagination::Paging};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    /// Case-insensitive substring over title, address fields and creator.
    pub search: Option<String>,
    pub property_type: Option<PropertyType>,
    pub mode: Option<ListingMode>,
    pub is_hidden: Option<bool>,
    pub is_featured: Option<bool>,
    /// Never taken from the query string; set by owner-scoped endpoints.
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Price,
    Title,
}

impl SortKey {
    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Price => "price",
            Self::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub paging: Paging,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl ListingPage {
    /// ` ORDER BY ...` with a stable tie-break on id.
    pub fn order_by_sql(&self) -> String {
        let dir = match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        format!(" ORDER BY {} {dir}, id {dir}", self.sort.column())
    }

    pub fn sort_in_memory(&self, listings: &mut [Listing]) {
        listings.sort_by(|a, b| {
            let ord = match self.sort {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::Price => a.price.total_cmp(&b.price),
                SortKey::Title => a.title.cmp(&b.title),
            }
            .then_with(|| a.id.cmp(&b.id));
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }
}

impl ListingFilter {
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Appends ` WHERE ...` for this filter.
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(term) = self.search_term() {
            let pattern = contains_pattern(&term);
            qb.push(" AND (");
            for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }
        if let Some(property_type) = self.property_type {
            qb.push(" AND property_type = ").push_bind(property_type.as_str());
        }
        if let Some(mode) = self.mode {
            qb.push(" AND mode = ").push_bind(mode.as_str());
        }
        if let Some(hidden) = self.is_hidden {
            qb.push(" AND is_hidden = ").push_bind(hidden);
        }
        if let Some(featured) = self.is_featured {
            qb.push(" AND is_featured = ").push_bind(featured);
        }
        if let Some(owner) = self.created_by {
            qb.push(" AND created_by = ").push_bind(owner);
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if self.property_type.is_some_and(|t| t != listing.property_type) {
            return false;
        }
        if self.mode.is_some_and(|m| m != listing.mode) {
            return false;
        }
        if self.is_hidden.is_some_and(|h| h != listing.is_hidden) {
            return false;
        }
        if self.is_featured.is_some_and(|f| f != listing.is_featured) {
            return false;
        }
        if self.created_by.is_some_and(|o| o != listing.created_by) {
            return false;
        }
        match self.search_term() {
            Some(term) => searchable_fields(listing)
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term)),
            None => true,
        }
    }
}

const SEARCH_COLUMNS: [&str; 7] = [
    "title",
    "address_line1",
    "address_line2",
    "city_town",
    "upazila",
    "district",
    "creator_email",
];

fn searchable_fields(l: &Listing) -> [Option<&str>; 7] {
    [
        Some(l.title.as_str()),
        Some(l.address_line1.as_str()),
        l.address_line2.as_deref(),
        Some(l.city_town.as_str()),
        Some(l.upazila.as_str()),
        Some(l.district.as_str()),
        Some(l.creator_email.as_str()),
    ]
}

/// Query string accepted by the listing search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub search: Option<String>,
    pub property_type: Option<String>,
    #[serde(alias = "listingType")]
    pub mode: Option<String>,
    pub is_hidden: Option<String>,
    pub is_featured: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

fn blank_to_none(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(field: &str, v: &Option<String>) -> Result<Option<bool>, AppError> {
    match blank_to_none(v) {
        None => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(_) => Err(AppError::bad_request(format!(
            "{field} filter must be true or false."
        ))),
    }
}

impl ListingQuery {
    /// Validates the raw query. Blank values count as absent, matching how
    /// the admin UI sends cleared filters.
    pub fn into_parts(self) -> Result<(ListingFilter, ListingPage), AppError> {
        let property_type = blank_to_none(&self.property_type)
            .map(|raw| {
                PropertyType::parse(raw)
                    .ok_or_else(|| AppError::bad_request("Invalid property type filter."))
            })
            .transpose()?;
        let mode = blank_to_none(&self.mode)
            .map(|raw| {
                ListingMode::parse(raw)
                    .ok_or_else(|| AppError::bad_request("Invalid listing type filter."))
            })
            .transpose()?;
        let is_hidden = parse_bool("isHidden", &self.is_hidden)?;
        let is_featured = parse_bool("isFeatured", &self.is_featured)?;

        let sort = match blank_to_none(&self.sort) {
            None => SortKey::default(),
            Some("createdAt") => SortKey::CreatedAt,
            Some("price") => SortKey::Price,
            Some("title") => SortKey::Title,
            Some(_) => return Err(AppError::bad_request("Invalid sort field.")),
        };
        let order = match blank_to_none(&self.order) {
            None => SortOrder::default(),
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(_) => return Err(AppError::bad_request("Order must be \"asc\" or \"desc\".")),
        };

        let filter = ListingFilter {
            search: self.search,
            property_type,
            mode,
            is_hidden,
            is_featured,
            created_by: None,
        };
        let page = ListingPage {
            paging: Paging::new(self.page, self.limit)?,
            sort,
            order,
        };
        Ok((filter, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_listing;

    fn where_sql(filter: &ListingFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM listings");
        filter.push_conditions(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn empty_filter_imposes_no_constraint() {
        assert_eq!(
            where_sql(&ListingFilter::default()),
            "SELECT id FROM listings WHERE TRUE"
        );
    }

    #[test]
    fn type_mode_and_visibility_compose_with_and() {
        let filter = ListingFilter {
            mode: Some(ListingMode::Rent),
            property_type: Some(PropertyType::Apartment),
            is_hidden: Some(false),
            ..Default::default()
        };
        assert_eq!(
            where_sql(&filter),
            "SELECT id FROM listings WHERE TRUE AND property_type = $1 AND mode = $2 AND is_hidden = $3"
        );
    }

    #[test]
    fn search_spans_every_text_column() {
        let filter = ListingFilter {
            search: Some("gulshan".into()),
            is_featured: Some(true),
            ..Default::default()
        };
        let sql = where_sql(&filter);
        for column in SEARCH_COLUMNS {
            assert!(sql.contains(&format!("{column} ILIKE")), "{column} missing from {sql}");
        }
        assert!(sql.ends_with(") AND is_featured = $8"), "{sql}");
    }

    #[test]
    fn owner_constraint_is_bound_last() {
        let owner = Uuid::new_v4();
        let filter = ListingFilter {
            is_hidden: Some(true),
            created_by: Some(owner),
            ..Default::default()
        };
        assert_eq!(
            where_sql(&filter),
            "SELECT id FROM listings WHERE TRUE AND is_hidden = $1 AND created_by = $2"
        );

        let by_owner = ListingFilter {
            created_by: Some(owner),
            ..Default::default()
        };
        let mut mine = sample_listing("Mine");
        mine.created_by = owner;
        assert!(by_owner.matches(&mine));
        assert!(!by_owner.matches(&sample_listing("Theirs")));
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = ListingFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(where_sql(&filter), "SELECT id FROM listings WHERE TRUE");
        assert!(filter.matches(&sample_listing("anything")));
    }

    #[test]
    fn in_memory_predicate_matches_fields() {
        let mut l = sample_listing("Sunny Rental Flat");
        l.mode = ListingMode::Rent;
        l.property_type = PropertyType::Apartment;
        l.creator_email = "karim@example.com".into();

        let by_creator = ListingFilter {
            search: Some("KARIM".into()),
            ..Default::default()
        };
        assert!(by_creator.matches(&l));

        let wrong_mode = ListingFilter {
            mode: Some(ListingMode::Buy),
            ..Default::default()
        };
        assert!(!wrong_mode.matches(&l));

        l.is_hidden = true;
        let visible_only = ListingFilter {
            is_hidden: Some(false),
            ..Default::default()
        };
        assert!(!visible_only.matches(&l));
    }

    #[test]
    fn query_parsing_validates_and_defaults() {
        let (filter, page) = ListingQuery {
            search: Some("".into()),
            property_type: Some("house".into()),
            mode: Some("".into()),
            is_hidden: Some("false".into()),
            sort: Some("price".into()),
            order: Some("asc".into()),
            ..Default::default()
        }
        .into_parts()
        .unwrap();
        assert_eq!(filter.property_type, Some(PropertyType::House));
        assert_eq!(filter.mode, None);
        assert_eq!(filter.is_hidden, Some(false));
        assert_eq!(filter.is_featured, None);
        assert_eq!(page.sort, SortKey::Price);
        assert_eq!(page.order, SortOrder::Asc);
        assert_eq!(page.paging, Paging::default());
        assert_eq!(page.order_by_sql(), " ORDER BY price ASC, id ASC");

        let bad = ListingQuery {
            is_featured: Some("yes".into()),
            ..Default::default()
        };
        assert!(bad.into_parts().is_err());

        let bad_type = ListingQuery {
            property_type: Some("castle".into()),
            ..Default::default()
        };
        assert!(bad_type.into_parts().is_err());
    }
}
