//! Serde adapters for `f64` fields that may hold NaN or infinities.
//!
//! JSON has no literal for non-finite numbers, so they are written as the
//! strings `"NaN"`, `"Infinity"` and `"-Infinity"`. Reading accepts plain
//! numbers, any string `f64::from_str` understands, and `null` as NaN.

use serde::de::{self, Deserializer, Unexpected};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// `f64` with a JSON form for every value, finite or not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsonFloat(pub f64);

impl Serialize for JsonFloat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.0;
        if value.is_finite() {
            serializer.serialize_f64(value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Wire {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for JsonFloat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Wire>::deserialize(deserializer)? {
            None => Ok(JsonFloat(f64::NAN)),
            Some(Wire::Number(value)) => Ok(JsonFloat(value)),
            Some(Wire::Text(text)) => text.trim().parse::<f64>().map(JsonFloat).map_err(|_| {
                de::Error::invalid_value(Unexpected::Str(&text), &"a number or \"NaN\"/\"Infinity\"")
            }),
        }
    }
}

/// `#[serde(with = "json_float::scalar")]` for plain `f64` fields.
pub mod scalar {
    use super::JsonFloat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        JsonFloat(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        JsonFloat::deserialize(deserializer).map(|value| value.0)
    }
}

/// `#[serde(with = "json_float::list")]` for `Vec<f64>` fields.
pub mod list {
    use super::JsonFloat;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|value| JsonFloat(*value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<JsonFloat>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|value| value.0).collect())
    }
}

/// `#[serde(with = "json_float::optional")]`; here `null` means `None`.
pub mod optional {
    use super::JsonFloat;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&JsonFloat(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Ok(Option::<JsonFloat>::deserialize(deserializer)?.map(|value| value.0))
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFloat;
    use serde_json::json;

    #[test]
    fn non_finite_values_are_written_as_strings() {
        let encoded = serde_json::to_value([
            JsonFloat(1.5),
            JsonFloat(f64::NAN),
            JsonFloat(f64::INFINITY),
            JsonFloat(f64::NEG_INFINITY),
        ])
        .expect("encode");
        assert_eq!(encoded, json!([1.5, "NaN", "Infinity", "-Infinity"]));
    }

    #[test]
    fn strings_numbers_and_null_are_read_back() {
        let decoded: Vec<JsonFloat> =
            serde_json::from_value(json!([2, "-Infinity", "inf", "0.25", null])).expect("decode");
        assert_eq!(decoded[0].0, 2.0);
        assert_eq!(decoded[1].0, f64::NEG_INFINITY);
        assert_eq!(decoded[2].0, f64::INFINITY);
        assert_eq!(decoded[3].0, 0.25);
        assert!(decoded[4].0.is_nan());
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        assert!(serde_json::from_value::<JsonFloat>(json!("wide")).is_err());
        assert!(serde_json::from_value::<JsonFloat>(json!(true)).is_err());
    }
}
