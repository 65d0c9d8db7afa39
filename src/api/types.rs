use serde::{Deserialize, Serialize};

/// Value meaning "no constraint" for string-typed filter fields
pub const ALL_SENTINEL: &str = "all";

/// Filter field to query parameter, in serialization order
pub const FILTER_PARAMS: [(&str, &str); 12] = [
    ("regionId", "regionId"),
    ("cityId", "cityId"),
    ("neighborhoodId", "neighborhoodId"),
    ("propertyType", "propertyTypeId"),
    ("listingType", "listingTypeId"),
    ("minPrice", "minPrice"),
    ("maxPrice", "maxPrice"),
    ("minArea", "minArea"),
    ("maxArea", "maxArea"),
    ("roomsCount", "roomsCount"),
    ("bathroomsCount", "bathroomsCount"),
    ("search", "search"),
];

/// Search parameters for the listing page.
///
/// A field constrains results only when it is active: present, and for the
/// string fields also non-empty and not `"all"`. The filter engine and the
/// query builder both go through the accessors below so the rule is applied
/// the same way in both places.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyFilters {
    pub region_id: Option<i64>,
    pub city_id: Option<i64>,
    pub neighborhood_id: Option<i64>,
    /// Property type lookup id
    pub property_type: Option<i64>,
    /// Listing type lookup id as a string (`"1"` sale, `"2"` rent) or `"all"`
    pub listing_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub rooms_count: Option<i64>,
    pub bathrooms_count: Option<i64>,
    /// Free-text search
    pub search: Option<String>,
}

fn active_text(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL_SENTINEL)
}

impl PropertyFilters {
    /// Raw listing type id, if the field is active
    pub fn listing_type(&self) -> Option<&str> {
        active_text(&self.listing_type)
    }

    pub fn search(&self) -> Option<&str> {
        active_text(&self.search)
    }

    /// Number of active fields
    pub fn active_count(&self) -> usize {
        self.to_query().len()
    }

    pub fn has_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Serialize every active field to exactly one query parameter
    pub fn to_query(&self) -> Vec<(String, String)> {
        let values: [Option<String>; 12] = [
            self.region_id.map(|v| v.to_string()),
            self.city_id.map(|v| v.to_string()),
            self.neighborhood_id.map(|v| v.to_string()),
            self.property_type.map(|v| v.to_string()),
            self.listing_type().map(str::to_string),
            self.min_price.map(|v| v.to_string()),
            self.max_price.map(|v| v.to_string()),
            self.min_area.map(|v| v.to_string()),
            self.max_area.map(|v| v.to_string()),
            self.rooms_count.map(|v| v.to_string()),
            self.bathrooms_count.map(|v| v.to_string()),
            self.search().map(str::to_string),
        ];

        FILTER_PARAMS
            .iter()
            .zip(values)
            .filter_map(|((_, param), value)| value.map(|v| (param.to_string(), v)))
            .collect()
    }
}
