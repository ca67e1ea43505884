use core::fmt;
use core::marker::PhantomData;

use hashbrown::HashMap;
use ndarray::ArrayD;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::TileSnapshot;

/// Value stored under one key of a [state map](StateMap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateValue {
    /// Ordinary parameter or buffer.
    Tensor(ArrayD<f32>),
    /// Scalar value.
    Scalar(f64),
    /// Complete state of an analog tile.
    Tile(Box<TileSnapshot>),
}

impl StateValue {
    /// The tensor, if the value is one.
    pub fn as_tensor(&self) -> Option<&ArrayD<f32>> {
        match self {
            Self::Tensor(tensor) => Some(tensor),
            _ => None,
        }
    }

    /// The tile snapshot, if the value is one.
    pub fn as_tile(&self) -> Option<&TileSnapshot> {
        match self {
            Self::Tile(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Whether every number held by the value is finite.
    ///
    /// The configuration of a tile snapshot isn't inspected.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Tensor(tensor) => tensor.iter().all(|v| v.is_finite()),
            Self::Scalar(value) => value.is_finite(),
            Self::Tile(snapshot) => snapshot.is_finite(),
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Tensor(_) => "tensor",
            Self::Scalar(_) => "scalar",
            Self::Tile(_) => "tile snapshot",
        }
    }
}

impl From<ArrayD<f32>> for StateValue {
    fn from(tensor: ArrayD<f32>) -> Self {
        Self::Tensor(tensor)
    }
}

impl From<TileSnapshot> for StateValue {
    fn from(snapshot: TileSnapshot) -> Self {
        Self::Tile(Box::new(snapshot))
    }
}

/// Flat, insertion ordered map from dotted keys to values.
#[derive(Debug, Clone, Default)]
pub struct StateMap {
    entries: Vec<(String, StateValue)>,
    index: HashMap<String, usize>,
}

impl StateMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one.
    ///
    /// Replacing a value keeps the position of the key.
    pub fn insert(&mut self, key: impl Into<String>, value: StateValue) -> Option<StateValue> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&position) => Some(core::mem::replace(&mut self.entries[position].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Value under `key`.
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Remove `key`, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<StateValue> {
        let position = self.index.remove(key)?;
        let (_, value) = self.entries.remove(position);
        for (_, index) in self.index.iter_mut() {
            if *index > position {
                *index -= 1;
            }
        }
        Some(value)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the first value holding a NaN or an infinity.
    pub fn find_non_finite(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(key, _)| key.as_str())
    }
}

impl PartialEq for StateMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for StateMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.entries.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct StateMapVisitor {
    marker: PhantomData<StateMap>,
}

impl<'de> Visitor<'de> for StateMapVisitor {
    type Value = StateMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of state keys to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = StateMap::new();

        while let Some((key, value)) = access.next_entry::<String, StateValue>()? {
            if map.contains_key(&key) {
                return Err(serde::de::Error::custom(format!("duplicate key '{key}'")));
            }
            map.insert(key, value);
        }

        Ok(map)
    }
}

impl<'de> Deserialize<'de> for StateMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StateMapVisitor {
            marker: PhantomData,
        })
    }
}
