//! Custom deserializers for forgiving question-metadata parsing.
//!
//! The hosting platform sends `null` for many optional fields. These helpers let the
//! question model use plain `String`/`bool`/`Vec` fields instead of `Option` wrappers.

use serde::{Deserialize, Deserializer};

/// Deserializes `null` (or a missing field, with `#[serde(default)]`) as `T::default()`.
///
/// # Examples
///
/// ```json
/// { "fine_print": null }        // -> ""
/// { "open_upper_bound": null }  // -> false
/// { "options": null }           // -> []
/// ```
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a number that may arrive as a JSON number or a numeric string.
///
/// Empty strings and `null` become `None`.
pub fn de_option_f64_forgiving<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let opt = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(v) = opt else { return Ok(None) };
    match v {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("invalid numeric value")),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid numeric string: '{}'", s)))
        }
        _ => Err(D::Error::custom("expected number, numeric string, or null")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
        #[serde(default, deserialize_with = "de_option_f64_forgiving")]
        number: Option<f64>,
    }

    #[test]
    fn null_and_missing_become_defaults() {
        let p: Probe = serde_json::from_str(r#"{"text": null}"#).unwrap();
        assert_eq!(p.text, "");
        assert_eq!(p.number, None);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let p: Probe = serde_json::from_str(r#"{"text": "x", "number": " 12.5 "}"#).unwrap();
        assert_eq!(p.number, Some(12.5));
        assert!(serde_json::from_str::<Probe>(r#"{"number": "abc"}"#).is_err());
    }
}
