use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Condo,
    Land,
    Commercial,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::House => "house",
            Self::Condo => "condo",
            Self::Land => "land",
            Self::Commercial => "commercial",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "apartment" => Some(Self::Apartment),
            "house" => Some(Self::House),
            "condo" => Some(Self::Condo),
            "land" => Some(Self::Land),
            "commercial" => Some(Self::Commercial),
            _ => None,
        }
    }
}

/// Listing mode: what the listing offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    Rent,
    Buy,
    Sold,
}

impl ListingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rent => "rent",
            Self::Buy => "buy",
            Self::Sold => "sold",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "rent" => Some(Self::Rent),
            "buy" => Some(Self::Buy),
            "sold" => Some(Self::Sold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Furnished {
    #[default]
    No,
    Semi,
    Full,
}

impl Furnished {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Semi => "semi",
            Self::Full => "full",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "no" => Some(Self::No),
            "semi" => Some(Self::Semi),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingFeatures {
    pub parking: bool,
    pub garden: bool,
    pub air_conditioning: bool,
    pub furnished: Furnished,
    pub pool: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city_town: String,
    pub upazila: String,
    pub district: String,
    pub postal_code: String,
    pub property_type: PropertyType,
    pub mode: ListingMode,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: Option<f64>,
    pub features: ListingFeatures,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub is_hidden: bool,
    pub is_featured: bool,
    pub created_by: Uuid,
    pub creator_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Listing as stored in the `listings` table; features are flattened.
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city_town: String,
    pub upazila: String,
    pub district: String,
    pub postal_code: String,
    pub property_type: String,
    pub mode: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: Option<f64>,
    pub parking: bool,
    pub garden: bool,
    pub air_conditioning: bool,
    pub furnished: String,
    pub pool: bool,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub is_hidden: bool,
    pub is_featured: bool,
    pub created_by: Uuid,
    pub creator_email: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ListingRow> for Listing {
    type Error = anyhow::Error;

    fn try_from(r: ListingRow) -> Result<Self, Self::Error> {
        let property_type = PropertyType::parse(&r.property_type)
            .ok_or_else(|| anyhow!("listing {}: unknown property type {:?}", r.id, r.property_type))?;
        let mode = ListingMode::parse(&r.mode)
            .ok_or_else(|| anyhow!("listing {}: unknown mode {:?}", r.id, r.mode))?;
        let furnished = Furnished::parse(&r.furnished)
            .ok_or_else(|| anyhow!("listing {}: unknown furnished value {:?}", r.id, r.furnished))?;
        Ok(Self {
            id: r.id,
            title: r.title,
            price: r.price,
            address_line1: r.address_line1,
            address_line2: r.address_line2,
            city_town: r.city_town,
            upazila: r.upazila,
            district: r.district,
            postal_code: r.postal_code,
            property_type,
            mode,
            bedrooms: r.bedrooms,
            bathrooms: r.bathrooms,
            area: r.area,
            features: ListingFeatures {
                parking: r.parking,
                garden: r.garden,
                air_conditioning: r.air_conditioning,
                furnished,
                pool: r.pool,
            },
            description: r.description,
            images: r.images,
            is_hidden: r.is_hidden,
            is_featured: r.is_featured,
            created_by: r.created_by,
            creator_email: r.creator_email,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Listing counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ListingStats {
    pub total: i64,
    pub hidden: i64,
    pub featured: i64,
}
