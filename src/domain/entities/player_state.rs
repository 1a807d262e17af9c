use serde::{Deserialize, Deserializer, Serialize};

use super::{CardCatalog, CardId};
use crate::domain::DataError;

/// Maximum number of Pokémon on a bench. Enforced by the Referee, not by the type.
pub const MAX_BENCH_SIZE: usize = 5;

/// A card sitting in a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRef {
    pub id: CardId,
}

impl CardRef {
    pub fn new(id: impl Into<CardId>) -> Self {
        Self { id: id.into() }
    }
}

/// A Pokémon in the active slot or on the bench
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokemonInPlay {
    pub id: CardId,
    pub hp: i32,
    #[serde(default)]
    pub attached_cards: Option<Vec<CardRef>>,
}

impl PokemonInPlay {
    pub fn new(id: impl Into<CardId>, hp: i32) -> Self {
        Self {
            id: id.into(),
            hp,
            attached_cards: None,
        }
    }

    pub fn with_attached(mut self, cards: Vec<CardRef>) -> Self {
        self.attached_cards = Some(cards);
        self
    }

    pub fn attached(&self) -> &[CardRef] {
        self.attached_cards.as_deref().unwrap_or(&[])
    }

    fn card_ids(&self) -> impl Iterator<Item = CardId> + '_ {
        std::iter::once(self.id).chain(self.attached().iter().map(|c| c.id))
    }
}

/// One player's zones
///
/// Every key must be present when deserializing; list zones may be `null`
/// (read as empty). A state update that drops a zone is rejected instead of
/// silently emptying it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(deserialize_with = "Option::deserialize")]
    pub active: Option<PokemonInPlay>,
    #[serde(deserialize_with = "nullable_zone")]
    pub bench: Vec<PokemonInPlay>,
    #[serde(deserialize_with = "nullable_zone")]
    pub discard: Vec<CardRef>,
    #[serde(deserialize_with = "nullable_zone")]
    pub lost_zone: Vec<CardRef>,
    #[serde(deserialize_with = "nullable_zone")]
    pub deck: Vec<CardRef>,
    #[serde(deserialize_with = "nullable_zone")]
    pub hand: Vec<CardRef>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub stadium: Option<CardRef>,
    #[serde(deserialize_with = "nullable_zone")]
    pub prize_cards: Vec<CardRef>,
}

pub(crate) fn nullable_zone<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl PlayerState {
    /// Every card id referenced anywhere in this player's zones
    pub fn card_ids(&self) -> Vec<CardId> {
        let mut ids = Vec::new();
        for pokemon in self.active.iter().chain(self.bench.iter()) {
            ids.extend(pokemon.card_ids());
        }
        for zone in [
            &self.discard,
            &self.lost_zone,
            &self.deck,
            &self.hand,
            &self.prize_cards,
        ] {
            ids.extend(zone.iter().map(|c| c.id));
        }
        ids.extend(self.stadium.iter().map(|c| c.id));
        ids
    }

    /// Check that every referenced card resolves in the catalog
    pub fn validate(&self, catalog: &CardCatalog) -> Result<(), DataError> {
        match self.card_ids().into_iter().find(|id| !catalog.contains(*id)) {
            Some(id) => Err(DataError::UnknownCard(id)),
            None => Ok(()),
        }
    }

    pub fn card_count(&self) -> usize {
        self.card_ids().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_zone_is_rejected() {
        let value = json!({
            "active": null,
            "bench": [],
            "discard": [],
            "lostZone": [],
            "hand": [],
            "stadium": null,
            "prizeCards": []
        });
        let err = serde_json::from_value::<PlayerState>(value).unwrap_err();
        assert!(err.to_string().contains("deck"));
    }

    #[test]
    fn test_null_zones_read_as_empty() {
        let value = json!({
            "active": {"id": 17, "hp": 170, "attachedCards": null},
            "bench": null,
            "discard": null,
            "lostZone": null,
            "deck": [{"id": 3}],
            "hand": null,
            "stadium": null,
            "prizeCards": null
        });
        let state: PlayerState = serde_json::from_value(value).unwrap();
        assert!(state.bench.is_empty());
        assert_eq!(state.deck, vec![CardRef::new(3)]);
        assert_eq!(state.active.unwrap().hp, 170);
    }

    #[test]
    fn test_pokemon_without_id_is_rejected() {
        let value = json!({
            "active": {"hp": 70},
            "bench": [],
            "discard": [],
            "lostZone": [],
            "deck": [],
            "hand": [],
            "stadium": null,
            "prizeCards": []
        });
        assert!(serde_json::from_value::<PlayerState>(value).is_err());
    }

    #[test]
    fn test_card_ids_include_attachments() {
        let state = PlayerState {
            active: Some(PokemonInPlay::new(1, 70).with_attached(vec![CardRef::new(2)])),
            bench: vec![PokemonInPlay::new(3, 60)],
            hand: vec![CardRef::new(4)],
            stadium: Some(CardRef::new(5)),
            ..Default::default()
        };
        let mut ids = state.card_ids();
        ids.sort();
        assert_eq!(ids, vec![CardId(1), CardId(2), CardId(3), CardId(4), CardId(5)]);
    }
}
