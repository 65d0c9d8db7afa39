use super::{null_as_default, Language};
use serde::{Deserialize, Serialize};

/// A rental listing as returned by the consumer endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Property {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description_ar: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description_en: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub area: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub rooms_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bathrooms_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub livingrooms_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub floors_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub building_age: i64,

    // Foreign keys into the lookup collections
    pub region_id: Option<i64>,
    pub city_id: Option<i64>,
    pub neighborhood_id: Option<i64>,
    pub property_type_id: Option<i64>,
    pub listing_type_id: Option<i64>,
    pub condition_id: Option<i64>,
    pub finish_type_id: Option<i64>,
    pub owner_id: Option<i64>,

    #[serde(deserialize_with = "null_as_default")]
    pub street_ar: String,
    #[serde(deserialize_with = "null_as_default")]
    pub street_en: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub image_urls: Vec<String>,
    /// Feature lookup ids
    #[serde(deserialize_with = "null_as_default")]
    pub features: Vec<i64>,
}

impl Property {
    pub fn description(&self, language: Language) -> &str {
        match language {
            Language::Ar => &self.description_ar,
            Language::En => &self.description_en,
        }
    }

    pub fn street(&self, language: Language) -> &str {
        match language {
            Language::Ar => &self.street_ar,
            Language::En => &self.street_en,
        }
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}
