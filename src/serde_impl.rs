//! Serde support: a map serializes as a map, a set as a sequence,
//! both in ascending order. Deserialized collections use the natural order.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::{AvlTreeMap, AvlTreeSet};

impl<K: Serialize, V: Serialize, C> Serialize for AvlTreeMap<K, V, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<T: Serialize, C> Serialize for AvlTreeSet<T, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

struct MapVisitor<K, V> {
    marker: PhantomData<fn() -> (K, V)>,
}

impl<'de, K, V> Visitor<'de> for MapVisitor<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    type Value = AvlTreeMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = AvlTreeMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.try_insert(key, value).map_err(de::Error::custom)?;
        }
        Ok(map)
    }
}

impl<'de, K, V> Deserialize<'de> for AvlTreeMap<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MapVisitor {
            marker: PhantomData,
        })
    }
}

struct SetVisitor<T> {
    marker: PhantomData<fn() -> T>,
}

impl<'de, T> Visitor<'de> for SetVisitor<T>
where
    T: Deserialize<'de> + Ord,
{
    type Value = AvlTreeSet<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut set = AvlTreeSet::new();
        while let Some(value) = access.next_element()? {
            set.try_insert(value).map_err(de::Error::custom)?;
        }
        Ok(set)
    }
}

impl<'de, T> Deserialize<'de> for AvlTreeSet<T>
where
    T: Deserialize<'de> + Ord,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(SetVisitor {
            marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{AvlTreeMap, AvlTreeSet};

    #[test]
    fn test_map_json_round_trip() {
        let map: AvlTreeMap<String, i32> = [("b", 2), ("a", 1), ("c", 3)]
            .iter()
            .map(|&(k, v)| (k.to_string(), v))
            .collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"a":1,"b":2,"c":3}"#);

        let back: AvlTreeMap<String, i32> = serde_json::from_str(&json).unwrap();
        back.check_consistency();
        assert_eq!(back, map);
    }

    #[test]
    fn test_set_json_round_trip() {
        let set: AvlTreeSet<i32> = [5, 3, 9, 1].iter().copied().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[1,3,5,9]");

        let back: AvlTreeSet<i32> = serde_json::from_str("[9,1,5,3,5]").unwrap();
        back.check_consistency();
        assert_eq!(back, set);
    }
}
