//! Serde helpers for PATCH-style payloads

use serde::{Deserialize, Deserializer, de};
use std::fmt;
use std::str::FromStr;

/// Distinguish an absent field from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "serde_helpers::double_option")]`
/// on an `Option<Option<T>>`:
/// - field missing -> `None` (leave unchanged)
/// - `null` -> `Some(None)` (clear)
/// - value -> `Some(Some(v))` (set)
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserialize a comma separated string into a list, dropping blanks.
///
/// Query strings carry list filters as `?cities=Moscow,Kazan`.
pub fn comma_list<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    T: FromStr,
    T::Err: fmt::Display,
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<T>()
                .map_err(|e| de::Error::custom(format!("invalid list item '{}': {}", part, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        parent_id: Option<Option<Uuid>>,
    }

    #[derive(Debug, Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "comma_list")]
        cities: Vec<String>,
        #[serde(default, deserialize_with = "comma_list")]
        departments: Vec<Uuid>,
    }

    #[test]
    fn test_double_option_absent_null_value() {
        let p: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(p.parent_id, None);

        let p: Patch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(p.parent_id, Some(None));

        let id = Uuid::new_v4();
        let p: Patch = serde_json::from_str(&format!(r#"{{"parent_id": "{}"}}"#, id)).unwrap();
        assert_eq!(p.parent_id, Some(Some(id)));
    }

    #[test]
    fn test_comma_list() {
        let f: Filter = serde_json::from_str(r#"{"cities": "Moscow, Kazan,,"}"#).unwrap();
        assert_eq!(f.cities, vec!["Moscow", "Kazan"]);

        let f: Filter = serde_json::from_str("{}").unwrap();
        assert!(f.cities.is_empty());

        let id = Uuid::new_v4();
        let f: Filter = serde_json::from_str(&format!(r#"{{"departments": "{}"}}"#, id)).unwrap();
        assert_eq!(f.departments, vec![id]);

        let bad: Result<Filter, _> = serde_json::from_str(r#"{"departments": "nope"}"#);
        assert!(bad.is_err());
    }
}
