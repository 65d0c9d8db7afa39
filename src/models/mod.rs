mod lookup;
mod property;

pub use lookup::{filter_valid_items, pick, ItemId, LookupItem, LookupKind};
pub use property::Property;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Display language of the site
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }

    pub fn is_rtl(self) -> bool {
        self == Self::Ar
    }

    /// Text direction attribute for the document root
    pub fn dir(self) -> &'static str {
        if self.is_rtl() {
            "rtl"
        } else {
            "ltr"
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Ar => Self::En,
            Self::En => Self::Ar,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
#[error("unsupported language code: {0}")]
pub struct ParseLanguageError(String);

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" => Ok(Self::Ar),
            "en" => Ok(Self::En),
            other => Err(ParseLanguageError(other.to_string())),
        }
    }
}

/// One page of a paginated listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
}

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_defaults_to_arabic_rtl() {
        let lang = Language::default();
        assert_eq!(lang, Language::Ar);
        assert!(lang.is_rtl());
        assert_eq!(lang.dir(), "rtl");
        assert_eq!(lang.toggled().dir(), "ltr");
    }

    #[test]
    fn language_parses_codes() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" ar ".parse::<Language>().unwrap(), Language::Ar);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn decodes_spring_style_page() {
        let raw = r#"{
            "content": [1, 2],
            "number": 0,
            "size": 2,
            "totalElements": 5,
            "totalPages": 3,
            "first": true,
            "last": false
        }"#;
        let page: PaginatedResponse<i32> = serde_json::from_str(raw).unwrap();
        assert_eq!(page.content, vec![1, 2]);
        assert_eq!(page.total_elements, 5);
        assert!(page.first && !page.last);
    }
}
