//! Prompt text for the description generator.
//!
//! `propertyData` comes straight from the listing form, so fields are read
//! loosely: numbers may arrive as strings, and either the stored field name
//! or the form's shorter alias is accepted. Empty, zero, false and null
//! values all render as `N/A`.

use serde_json::{Map, Value};

pub const SYSTEM_PROMPT: &str =
    "You are a professional realtor crafting high-quality property descriptions.";

const NA: &str = "N/A";

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(a) => a.is_empty(),
        Value::Object(_) => false,
    }
}

fn render(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// First non-blank value among `keys`, or `N/A`.
fn field(data: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| data.get(*k))
        .find(|v| !is_blank(v))
        .map(render)
        .unwrap_or_else(|| NA.to_string())
}

fn feature_lines(features: Option<&Map<String, Value>>) -> String {
    let Some(f) = features else {
        return String::new();
    };
    let on = |key: &str| f.get(key).is_some_and(|v| !is_blank(v));
    let mut out = String::new();
    if on("parking") {
        out.push_str("- Ample parking space\n");
    }
    if on("garden") {
        out.push_str("- Beautiful garden area\n");
    }
    if on("airConditioning") {
        out.push_str("- Fully air-conditioned\n");
    }
    match f.get("furnished") {
        Some(Value::String(s)) if s == "semi" => out.push_str("- Semi-furnished\n"),
        Some(Value::String(s)) if s == "no" => {}
        Some(v) if !is_blank(v) => out.push_str("- Fully furnished\n"),
        _ => {}
    }
    if on("pool") {
        out.push_str("- Swimming pool\n");
    }
    out
}

pub fn build_prompt(data: &Map<String, Value>) -> String {
    let features = data.get("features").and_then(Value::as_object);
    format!(
        "You are a professional real estate agent. Generate a compelling 150-200 word \
         description for a property with these details:\n\n\
         Property Title: {title}\n\
         Property Type: {kind}\n\
         Listing Type: For {mode}\n\
         Price: {price} BDT\n\
         Location: {address}, {city}, {district}\n\
         Size: {area} square feet\n\
         Bedrooms: {bedrooms}\n\
         Bathrooms: {bathrooms}\n\n\
         Key Features:\n\
         {features}\n\
         Write an engaging description that highlights the property's best features, \
         location advantages, and potential uses. Use persuasive language suitable for a \
         property listing.",
        title = field(data, &["title"]),
        kind = field(data, &["propertyType"]),
        mode = field(data, &["listingType", "mode"]),
        price = field(data, &["price"]),
        address = field(data, &["addressLine1", "address"]),
        city = field(data, &["cityTown", "city"]),
        district = field(data, &["district", "state"]),
        area = field(data, &["area"]),
        bedrooms = field(data, &["bedrooms"]),
        bathrooms = field(data, &["bathrooms"]),
        features = feature_lines(features),
    )
}
