use super::{null_as_default, Language};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference-data categories served under `/lookup`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Region,
    City,
    Neighborhood,
    PropertyType,
    ListingType,
    Feature,
    Condition,
    FinishingType,
    StatusValue,
}

impl LookupKind {
    pub const ALL: [LookupKind; 9] = [
        Self::Region,
        Self::City,
        Self::Neighborhood,
        Self::PropertyType,
        Self::ListingType,
        Self::Feature,
        Self::Condition,
        Self::FinishingType,
        Self::StatusValue,
    ];

    /// Kinds rendered on nearly every page (header, filters, cards)
    pub const CRITICAL: [LookupKind; 4] = [
        Self::Region,
        Self::City,
        Self::PropertyType,
        Self::ListingType,
    ];

    /// Endpoint path relative to the API base URL
    pub fn path(self) -> &'static str {
        match self {
            Self::Region => "/lookup/regions",
            Self::City => "/lookup/cities",
            Self::Neighborhood => "/lookup/neighborhoods",
            Self::PropertyType => "/lookup/property-types",
            Self::ListingType => "/lookup/listing-types",
            Self::Feature => "/lookup/property-features",
            Self::Condition => "/lookup/property-conditions",
            Self::FinishingType => "/lookup/finishing-types",
            Self::StatusValue => "/lookup/property-status-values",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Region => "regions",
            Self::City => "cities",
            Self::Neighborhood => "neighborhoods",
            Self::PropertyType => "property types",
            Self::ListingType => "listing types",
            Self::Feature => "features",
            Self::Condition => "conditions",
            Self::FinishingType => "finishing types",
            Self::StatusValue => "status values",
        };
        f.write_str(name)
    }
}

/// Identifier of a lookup item as sent by the server.
///
/// Ids are numeric in well-formed data, but the endpoints have been seen to
/// return string ids (including `"undefined"`), so both shapes are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl ItemId {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    fn is_displayable(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(s) => {
                let s = s.trim();
                !s.is_empty() && s != "undefined" && s != "null"
            }
        }
    }
}

/// A bilingual reference-data entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LookupItem {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name_ar: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name_en: String,
}

impl LookupItem {
    pub fn new(id: i64, name_ar: impl Into<String>, name_en: impl Into<String>) -> Self {
        Self {
            id: Some(ItemId::Number(id)),
            name_ar: name_ar.into(),
            name_en: name_en.into(),
        }
    }

    pub fn numeric_id(&self) -> Option<i64> {
        self.id.as_ref().and_then(ItemId::as_number)
    }

    pub fn name(&self, language: Language) -> &str {
        pick(self, language)
    }

    /// Whether the item may be shown in a dropdown or chip list
    pub fn is_valid(&self) -> bool {
        let has_id = self.id.as_ref().is_some_and(ItemId::is_displayable);
        let has_name = !self.name_ar.trim().is_empty() || !self.name_en.trim().is_empty();
        has_id && has_name
    }
}

/// Name of `item` in `language`
pub fn pick(item: &LookupItem, language: Language) -> &str {
    match language {
        Language::Ar => &item.name_ar,
        Language::En => &item.name_en,
    }
}

/// Items fit for rendering; invalid entries are skipped, not removed
pub fn filter_valid_items(items: &[LookupItem]) -> Vec<&LookupItem> {
    items.iter().filter(|item| item.is_valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_numeric_string_and_null_ids() {
        let raw = r#"[
            {"id": 1, "nameAr": "الرياض", "nameEn": "Riyadh"},
            {"id": "undefined", "nameAr": "x", "nameEn": "x"},
            {"id": null, "nameAr": null, "nameEn": "Ghost"},
            {"nameEn": "No id"}
        ]"#;
        let items: Vec<LookupItem> = serde_json::from_str(raw).unwrap();

        assert_eq!(items[0].numeric_id(), Some(1));
        assert_eq!(items[1].id, Some(ItemId::Text("undefined".into())));
        assert_eq!(items[2].id, None);
        assert_eq!(items[2].name_ar, "");
        assert_eq!(items[3].id, None);
    }

    #[test]
    fn pick_follows_language() {
        let item = LookupItem::new(3, "جدة", "Jeddah");
        assert_eq!(pick(&item, Language::Ar), "جدة");
        assert_eq!(item.name(Language::En), "Jeddah");
    }

    #[test]
    fn validity_requires_usable_id_and_some_name() {
        let good = LookupItem::new(1, "", "Riyadh");
        let blank_names = LookupItem::new(2, " ", "");
        let text_null = LookupItem {
            id: Some(ItemId::Text("null".into())),
            name_ar: "a".into(),
            name_en: "a".into(),
        };
        let empty_text = LookupItem {
            id: Some(ItemId::Text(String::new())),
            name_ar: "a".into(),
            name_en: "a".into(),
        };
        let missing = LookupItem {
            id: None,
            name_ar: "a".into(),
            name_en: "a".into(),
        };

        assert!(good.is_valid());
        assert!(!blank_names.is_valid());
        assert!(!text_null.is_valid());
        assert!(!empty_text.is_valid());
        assert!(!missing.is_valid());

        let all = vec![good.clone(), blank_names, text_null, empty_text, missing];
        assert_eq!(filter_valid_items(&all), vec![&good]);
    }

    #[test]
    fn every_kind_has_a_lookup_path() {
        for kind in LookupKind::ALL {
            assert!(kind.path().starts_with("/lookup/"));
        }
    }
}
