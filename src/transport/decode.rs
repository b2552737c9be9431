//! Case-insensitive JSON decoding for REST responses.
//!
//! Struct field names are matched ignoring ASCII case, at every depth where
//! the target type is a struct. Keys of maps and of free-form [`Value`]s are
//! user data and pass through untouched.

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor,
};
use serde_json::{Map, Value};

/// Decodes `value` into `T`, matching struct fields case-insensitively.
pub(crate) fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    T::deserialize(CaseInsensitive(value))
}

/// Renames keys that differ from a struct field only by case to that field.
///
/// An exact match wins over a case-folded one; unknown keys are kept as
/// they are.
fn canonicalize(map: Map<String, Value>, fields: &'static [&'static str]) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        if fields.contains(&key.as_str()) {
            out.insert(key, value);
            continue;
        }
        match fields.iter().find(|field| field.eq_ignore_ascii_case(&key)) {
            Some(field) => {
                out.entry(*field).or_insert(value);
            },
            None => {
                out.insert(key, value);
            },
        }
    }
    out
}

struct CaseInsensitive(Value);

macro_rules! forward_to_value {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                self.0.$method(visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for CaseInsensitive {
    type Error = serde_json::Error;

    forward_to_value! {
        deserialize_any deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
        deserialize_f32 deserialize_f64 deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf deserialize_unit
        deserialize_identifier deserialize_ignored_any
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(CaseInsensitive(value)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => visitor.visit_seq(Elements(items.into_iter())),
            other => other.deserialize_seq(visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_tuple(len, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_tuple_struct(name, len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visitor.visit_map(Entries::new(map)),
            other => other.deserialize_map(visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visitor.visit_map(Entries::new(canonicalize(map, fields))),
            other => other.deserialize_struct(name, fields, visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }
}

struct Elements(std::vec::IntoIter<Value>);

impl<'de> SeqAccess<'de> for Elements {
    type Error = serde_json::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        self.0.next().map(|value| seed.deserialize(CaseInsensitive(value))).transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

struct Entries {
    iter: serde_json::map::IntoIter,
    value: Option<Value>,
}

impl Entries {
    fn new(map: Map<String, Value>) -> Self {
        Self { iter: map.into_iter(), value: None }
    }
}

impl<'de> MapAccess<'de> for Entries {
    type Error = serde_json::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Value::String(key)).map(Some)
            },
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(CaseInsensitive(value)),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Node {
        name: String,
        #[serde(default)]
        shard_count: u32,
        #[serde(default)]
        labels: HashMap<String, String>,
        #[serde(default)]
        stats: Option<Stats>,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Stats {
        object_count: u64,
    }

    #[test]
    fn test_mixed_and_upper_case_fields() {
        let nodes: Vec<Node> = from_value(json!([
            { "name": "node-1", "ShardCount": 3 },
            { "NAME": "node-2", "SHARDCOUNT": 5, "Stats": { "OBJECTCOUNT": 7 } }
        ]))
        .unwrap();

        assert_eq!(nodes[0].shard_count, 3);
        assert_eq!(nodes[1].name, "node-2");
        assert_eq!(nodes[1].shard_count, 5);
        assert_eq!(nodes[1].stats, Some(Stats { object_count: 7 }));
    }

    #[test]
    fn test_map_keys_are_data() {
        let node: Node =
            from_value(json!({ "Name": "n", "Labels": { "Zone": "eu", "zone": "us" } })).unwrap();

        assert_eq!(node.labels.len(), 2);
        assert_eq!(node.labels["Zone"], "eu");
        assert_eq!(node.labels["zone"], "us");
    }

    #[test]
    fn test_exact_match_wins() {
        let node: Node = from_value(json!({ "Name": "folded", "name": "exact" })).unwrap();
        assert_eq!(node.name, "exact");
    }

    #[test]
    fn test_free_form_value_untouched() {
        let value: Value = from_value(json!({ "Title": { "InnerKey": 1 } })).unwrap();
        assert_eq!(value, json!({ "Title": { "InnerKey": 1 } }));
    }

    #[test]
    fn test_type_errors_surface() {
        let err = from_value::<Node>(json!({ "name": 5 })).unwrap_err();
        assert!(err.to_string().contains("invalid type"));

        let err = from_value::<Node>(json!({ "ShardCount": 1 })).unwrap_err();
        assert!(err.to_string().contains("missing field `name`"));
    }
}
