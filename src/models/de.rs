//! Lenient field deserializers for vendor payloads. Vendors send the same
//! field as a JSON number, a numeric string, or (from SOAP) element text.
//! Blank strings and nulls become `None`.

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn scalar<'de, D>(deserializer: D) -> Result<Option<Scalar>, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(match v {
        Some(Scalar::Text(s)) if s.trim().is_empty() => None,
        other => other,
    })
}

pub fn f64_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match scalar(deserializer)? {
        Some(Scalar::Float(f)) => Ok(Some(f)),
        Some(Scalar::Int(i)) => Ok(Some(i as f64)),
        Some(Scalar::Text(s)) => s.trim().parse::<f64>().map(Some).map_err(de::Error::custom),
        Some(Scalar::Bool(b)) => Err(de::Error::custom(format!("expected number, got {}", b))),
        None => Ok(None),
    }
}

pub fn string_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match scalar(deserializer)? {
        Some(Scalar::Text(s)) => Some(s),
        Some(Scalar::Int(i)) => Some(i.to_string()),
        Some(Scalar::Float(f)) => Some(f.to_string()),
        Some(Scalar::Bool(b)) => Some(b.to_string()),
        None => None,
    })
}

pub fn bool_option<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match scalar(deserializer)? {
        Some(Scalar::Bool(b)) => Ok(Some(b)),
        Some(Scalar::Int(i)) => Ok(Some(i != 0)),
        Some(Scalar::Float(f)) => Ok(Some(f != 0.0)),
        Some(Scalar::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(de::Error::custom(format!("expected boolean, got '{}'", other))),
        },
        None => Ok(None),
    }
}
