//! Card identifiers and the shared card catalog
//!
//! Cards never change; only their placement on the board does. Every zone
//! refers to cards by `CardId`, and the catalog resolves ids to definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Identifier of one physical card in a match
///
/// Serialized as a number. Deserialization also accepts numeric strings since
/// JSON object keys (and some model output) carry ids as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CardId {
    fn from(id: u32) -> Self {
        CardId(id)
    }
}

impl<'de> Deserialize<'de> for CardId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CardIdVisitor;

        impl<'de> de::Visitor<'de> for CardIdVisitor {
            type Value = CardId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a card id (non-negative integer or numeric string)")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CardId, E> {
                u32::try_from(v)
                    .map(CardId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<CardId, E> {
                u32::try_from(v)
                    .map(CardId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<CardId, E> {
                if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                    Ok(CardId(v as u32))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CardId, E> {
                v.trim()
                    .parse::<u32>()
                    .map(CardId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(CardIdVisitor)
    }
}

/// Card category (the "supertype" in card data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardCategory {
    #[serde(rename = "Pokémon", alias = "Pokemon")]
    Pokemon,
    Trainer,
    Energy,
}

impl CardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardCategory::Pokemon => "Pokémon",
            CardCategory::Trainer => "Trainer",
            CardCategory::Energy => "Energy",
        }
    }
}

/// Immutable card definition
///
/// Only the fields the server reasons about are typed. Attacks, abilities,
/// weaknesses, rules text and images stay in `details` and are passed to the
/// agents as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub name: String,
    pub supertype: CardCategory,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<String>,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl CardDefinition {
    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.iter().any(|s| s == subtype)
    }

    pub fn is_basic_pokemon(&self) -> bool {
        self.supertype == CardCategory::Pokemon && self.has_subtype("Basic")
    }

    pub fn is_energy(&self) -> bool {
        self.supertype == CardCategory::Energy
    }

    pub fn is_stadium(&self) -> bool {
        self.supertype == CardCategory::Trainer && self.has_subtype("Stadium")
    }

    /// Printed hit points, if this is a Pokémon with a numeric hp value
    pub fn base_hp(&self) -> Option<i32> {
        self.hp.as_deref().and_then(|hp| hp.trim().parse().ok())
    }
}

/// Mapping from card id to definition, shared by both players
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardCatalog(BTreeMap<CardId, CardDefinition>);

impl CardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: CardId, definition: CardDefinition) {
        self.0.insert(id, definition);
    }

    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.0.get(&id)
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CardId, &CardDefinition)> {
        self.0.iter()
    }

    /// Catalog restricted to the given ids (unknown ids are skipped)
    pub fn subset<I: IntoIterator<Item = CardId>>(&self, ids: I) -> CardCatalog {
        let mut subset = CardCatalog::new();
        for id in ids {
            if let Some(definition) = self.0.get(&id) {
                subset.insert(id, definition.clone());
            }
        }
        subset
    }
}

impl FromIterator<(CardId, CardDefinition)> for CardCatalog {
    fn from_iter<T: IntoIterator<Item = (CardId, CardDefinition)>>(iter: T) -> Self {
        CardCatalog(iter.into_iter().collect())
    }
}
