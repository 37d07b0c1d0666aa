//! Decodes a JSON `null` as the field type's default value.
//!
//! `#[serde(default)]` only covers absent keys; the API also sends explicit
//! nulls for fields it has no value for.

use serde::{Deserialize, Deserializer};

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
