use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Listing, ListingFeatures, ListingMode, PropertyType};
use crate::{error::AppError, users::repo_types::User};

/// Request body for creating a listing. The creator comes from the
/// authenticated profile, never from the body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub title: String,
    pub price: f64,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city_town: String,
    pub upazila: String,
    pub district: String,
    pub postal_code: String,
    pub property_type: PropertyType,
    #[serde(alias = "listingType", default = "default_mode")]
    pub mode: ListingMode,
    #[serde(default)]
    pub bedrooms: i32,
    #[serde(default)]
    pub bathrooms: i32,
    pub area: Option<f64>,
    #[serde(default)]
    pub features: ListingFeatures,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_mode() -> ListingMode {
    ListingMode::Rent
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city_town: Option<String>,
    pub upazila: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    pub property_type: Option<PropertyType>,
    #[serde(alias = "listingType")]
    pub mode: Option<ListingMode>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    pub features: Option<ListingFeatures>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} is required.")));
    }
    Ok(())
}

fn check_numbers(price: f64, bedrooms: i32, bathrooms: i32, area: Option<f64>) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::bad_request("price must be a non-negative number."));
    }
    if bedrooms < 0 || bathrooms < 0 {
        return Err(AppError::bad_request("bedrooms and bathrooms cannot be negative."));
    }
    if area.is_some_and(|a| !a.is_finite() || a < 0.0) {
        return Err(AppError::bad_request("area must be a non-negative number."));
    }
    Ok(())
}

impl CreateListingRequest {
    pub fn into_listing(self, creator: &User) -> Result<Listing, AppError> {
        require_text("title", &self.title)?;
        require_text("addressLine1", &self.address_line1)?;
        require_text("cityTown", &self.city_town)?;
        require_text("upazila", &self.upazila)?;
        require_text("district", &self.district)?;
        require_text("postalCode", &self.postal_code)?;
        check_numbers(self.price, self.bedrooms, self.bathrooms, self.area)?;

        let now = OffsetDateTime::now_utc();
        Ok(Listing {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            price: self.price,
            address_line1: self.address_line1,
            address_line2: self.address_line2,
            city_town: self.city_town,
            upazila: self.upazila,
            district: self.district,
            postal_code: self.postal_code,
            property_type: self.property_type,
            mode: self.mode,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            features: self.features,
            description: self.description,
            images: self.images,
            is_hidden: false,
            is_featured: false,
            created_by: creator.id,
            creator_email: creator.email.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

impl UpdateListingRequest {
    /// Applies the patch in place and re-validates the result.
    pub fn apply(self, l: &mut Listing) -> Result<(), AppError> {
        if let Some(v) = self.title {
            require_text("title", &v)?;
            l.title = v.trim().to_string();
        }
        if let Some(v) = self.price {
            l.price = v;
        }
        if let Some(v) = self.address_line1 {
            require_text("addressLine1", &v)?;
            l.address_line1 = v;
        }
        if let Some(v) = self.address_line2 {
            l.address_line2 = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = self.city_town {
            require_text("cityTown", &v)?;
            l.city_town = v;
        }
        if let Some(v) = self.upazila {
            require_text("upazila", &v)?;
            l.upazila = v;
        }
        if let Some(v) = self.district {
            require_text("district", &v)?;
            l.district = v;
        }
        if let Some(v) = self.postal_code {
            require_text("postalCode", &v)?;
            l.postal_code = v;
        }
        if let Some(v) = self.property_type {
            l.property_type = v;
        }
        if let Some(v) = self.mode {
            l.mode = v;
        }
        if let Some(v) = self.bedrooms {
            l.bedrooms = v;
        }
        if let Some(v) = self.bathrooms {
            l.bathrooms = v;
        }
        if self.area.is_some() {
            l.area = self.area;
        }
        if let Some(v) = self.features {
            l.features = v;
        }
        if self.description.is_some() {
            l.description = self.description;
        }
        if let Some(v) = self.images {
            l.images = v;
        }
        check_numbers(l.price, l.bedrooms, l.bathrooms, l.area)?;
        l.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub is_hidden: bool,
}

#[derive(Debug, Deserialize)]
pub struct FeatureRequest {
    pub feature: bool,
}
