//! Client-side property filtering.
//!
//! Works purely on properties already held in memory: no I/O and no caching.
//! All active predicates are ANDed together.

use crate::api::PropertyFilters;
use crate::models::{PaginatedResponse, Property};
use std::borrow::Cow;

/// Whether `property` satisfies every active field of `filters`
pub fn matches(property: &Property, filters: &PropertyFilters) -> bool {
    if let Some(region) = filters.region_id {
        if property.region_id != Some(region) {
            return false;
        }
    }
    if let Some(city) = filters.city_id {
        if property.city_id != Some(city) {
            return false;
        }
    }
    if let Some(neighborhood) = filters.neighborhood_id {
        if property.neighborhood_id != Some(neighborhood) {
            return false;
        }
    }
    if let Some(raw) = filters.listing_type() {
        // An id that is not an integer cannot match any listing
        match raw.parse::<i64>() {
            Ok(id) if property.listing_type_id == Some(id) => {}
            _ => return false,
        }
    }
    if let Some(kind) = filters.property_type {
        if property.property_type_id != Some(kind) {
            return false;
        }
    }
    if !within(property.price, filters.min_price, filters.max_price) {
        return false;
    }
    if !within(property.area, filters.min_area, filters.max_area) {
        return false;
    }
    if let Some(rooms) = filters.rooms_count {
        if property.rooms_count != rooms {
            return false;
        }
    }
    if let Some(baths) = filters.bathrooms_count {
        if property.bathrooms_count != baths {
            return false;
        }
    }
    if let Some(term) = filters.search() {
        if !mentions(property, term) {
            return false;
        }
    }
    true
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

fn mentions(property: &Property, term: &str) -> bool {
    let needle = term.to_lowercase();
    [
        &property.title,
        &property.description_ar,
        &property.description_en,
        &property.street_ar,
        &property.street_en,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Subset of `properties` matching `filters`.
///
/// With no active field the input slice is handed back as-is.
pub fn filter_properties<'a>(
    properties: &'a [Property],
    filters: &PropertyFilters,
) -> Cow<'a, [Property]> {
    if !filters.has_active() {
        return Cow::Borrowed(properties);
    }

    Cow::Owned(
        properties
            .iter()
            .filter(|p| matches(p, filters))
            .cloned()
            .collect(),
    )
}

/// Page-shaped view of the filtered accumulator.
///
/// Pagination metadata comes from `template` (the first fetched page). When
/// filtering is active, `total_elements` is the filtered count rather than
/// the server total.
pub fn filtered_view(
    template: &PaginatedResponse<Property>,
    properties: &[Property],
    filters: &PropertyFilters,
) -> PaginatedResponse<Property> {
    let content = filter_properties(properties, filters).into_owned();
    let total_elements = if filters.has_active() {
        content.len() as u64
    } else {
        template.total_elements
    };

    PaginatedResponse {
        content,
        total_elements,
        ..template.clone()
    }
}
