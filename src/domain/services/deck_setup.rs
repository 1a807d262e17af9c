//! Starting positions from two deck lists
//!
//! Each physical card gets its own id, player one's deck first. Decks are
//! shuffled and laid out the same way for both sides: first Basic Pokémon
//! active, the next three benched with one Energy each, first Stadium in
//! play, then seven cards to hand, six prizes and the rest as the deck.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::domain::entities::{
    BoardState, CardCatalog, CardDefinition, CardId, CardRef, PlayerState, PokemonInPlay,
};

pub const OPENING_HAND_SIZE: usize = 7;
pub const PRIZE_CARD_COUNT: usize = 6;
pub const OPENING_BENCH_SIZE: usize = 3;
/// Active Pokémon plus opening hand plus prizes
pub const MIN_DECK_SIZE: usize = 1 + OPENING_HAND_SIZE + PRIZE_CARD_COUNT;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeckError {
    #[error("Invalid deck list: {0}")]
    Invalid(String),
    #[error("Deck '{0}' has no Basic Pokémon")]
    NoBasicPokemon(String),
    #[error("Deck '{deck}' has {size} cards, at least {minimum} are needed")]
    TooSmall {
        deck: String,
        size: usize,
        minimum: usize,
    },
}

/// A deck as a list of card definitions with copy counts
#[derive(Debug, Clone, Deserialize)]
pub struct DeckList {
    pub name: String,
    pub cards: Vec<DeckEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeckEntry {
    pub count: u32,
    pub card: CardDefinition,
}

impl DeckList {
    pub fn size(&self) -> usize {
        self.cards.iter().map(|entry| entry.count as usize).sum()
    }
}

/// Build a fresh board from two deck lists
///
/// The same seed always produces the same board.
pub fn setup_board(
    player_one: &DeckList,
    player_two: &DeckList,
    seed: Option<u64>,
) -> Result<BoardState, DeckError> {
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut catalog = CardCatalog::new();
    let mut next_id = 1u32;
    let one_ids = register_cards(player_one, &mut catalog, &mut next_id)?;
    let two_ids = register_cards(player_two, &mut catalog, &mut next_id)?;

    let one = setup_player(&player_one.name, one_ids, &catalog, &mut rng)?;
    let two = setup_player(&player_two.name, two_ids, &catalog, &mut rng)?;

    Ok(BoardState::new(one, two, catalog))
}

fn register_cards(
    deck: &DeckList,
    catalog: &mut CardCatalog,
    next_id: &mut u32,
) -> Result<Vec<CardId>, DeckError> {
    let size = deck.size();
    if size < MIN_DECK_SIZE {
        return Err(DeckError::TooSmall {
            deck: deck.name.clone(),
            size,
            minimum: MIN_DECK_SIZE,
        });
    }

    let mut ids = Vec::with_capacity(size);
    for entry in &deck.cards {
        for _ in 0..entry.count {
            let id = CardId(*next_id);
            *next_id += 1;
            catalog.insert(id, entry.card.clone());
            ids.push(id);
        }
    }
    Ok(ids)
}

fn setup_player(
    deck_name: &str,
    mut cards: Vec<CardId>,
    catalog: &CardCatalog,
    rng: &mut ChaCha8Rng,
) -> Result<PlayerState, DeckError> {
    cards.shuffle(rng);

    let is_basic = |id: CardId| catalog.get(id).is_some_and(|c| c.is_basic_pokemon());
    let is_energy = |id: CardId| catalog.get(id).is_some_and(|c| c.is_energy());
    let is_stadium = |id: CardId| catalog.get(id).is_some_and(|c| c.is_stadium());
    let hp_of = |id: CardId| catalog.get(id).and_then(|c| c.base_hp()).unwrap_or(0);

    let active_id = take_first(&mut cards, is_basic)
        .ok_or_else(|| DeckError::NoBasicPokemon(deck_name.to_string()))?;

    let mut bench = Vec::with_capacity(OPENING_BENCH_SIZE);
    while bench.len() < OPENING_BENCH_SIZE {
        let Some(id) = take_first(&mut cards, is_basic) else {
            break;
        };
        let mut pokemon = PokemonInPlay::new(id, hp_of(id));
        if let Some(energy) = take_first(&mut cards, is_energy) {
            pokemon = pokemon.with_attached(vec![CardRef::new(energy)]);
        }
        bench.push(pokemon);
    }

    let stadium = take_first(&mut cards, is_stadium).map(CardRef::new);

    let mut rest = cards.into_iter().map(CardRef::new);
    let hand: Vec<CardRef> = rest.by_ref().take(OPENING_HAND_SIZE).collect();
    let prize_cards: Vec<CardRef> = rest.by_ref().take(PRIZE_CARD_COUNT).collect();
    let deck: Vec<CardRef> = rest.collect();

    Ok(PlayerState {
        active: Some(PokemonInPlay::new(active_id, hp_of(active_id))),
        bench,
        discard: Vec::new(),
        lost_zone: Vec::new(),
        deck,
        hand,
        stadium,
        prize_cards,
    })
}

fn take_first(cards: &mut Vec<CardId>, predicate: impl Fn(CardId) -> bool) -> Option<CardId> {
    let position = cards.iter().position(|id| predicate(*id))?;
    Some(cards.remove(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn deck(name: &str, basics: u32, energy: u32, trainers: u32) -> DeckList {
        serde_json::from_value(json!({
            "name": name,
            "cards": [
                {"count": basics, "card": {"name": "Ralts", "supertype": "Pokémon", "subtypes": ["Basic"], "hp": "70"}},
                {"count": 2, "card": {"name": "Kirlia", "supertype": "Pokémon", "subtypes": ["Stage 1"], "hp": "80", "evolvesFrom": "Ralts"}},
                {"count": energy, "card": {"name": "Psychic Energy", "supertype": "Energy", "subtypes": ["Basic"]}},
                {"count": 1, "card": {"name": "Artazon", "supertype": "Trainer", "subtypes": ["Stadium"]}},
                {"count": trainers, "card": {"name": "Nest Ball", "supertype": "Trainer", "subtypes": ["Item"]}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_opening_layout() {
        let one = deck("one", 6, 10, 20);
        let two = deck("two", 6, 10, 20);
        let board = setup_board(&one, &two, Some(7)).unwrap();

        for player in [&board.player_one, &board.player_two] {
            let active = player.active.as_ref().unwrap();
            assert_eq!(active.hp, 70);
            assert_eq!(player.bench.len(), OPENING_BENCH_SIZE);
            assert!(player.bench.iter().all(|p| p.attached().len() == 1));
            assert!(player.stadium.is_some());
            assert_eq!(player.hand.len(), OPENING_HAND_SIZE);
            assert_eq!(player.prize_cards.len(), PRIZE_CARD_COUNT);
            assert!(player.discard.is_empty());
            assert!(player.lost_zone.is_empty());
            assert_eq!(player.card_count(), one.size());
        }
        assert!(board.validate().is_ok());
    }

    #[test]
    fn test_every_card_has_its_own_id() {
        let board = setup_board(&deck("one", 6, 10, 20), &deck("two", 6, 10, 20), Some(1)).unwrap();

        let mut seen = HashSet::new();
        for id in board
            .player_one
            .card_ids()
            .into_iter()
            .chain(board.player_two.card_ids())
        {
            assert!(seen.insert(id), "card {} placed twice", id);
        }
        assert_eq!(seen.len(), board.card_map.len());
    }

    #[test]
    fn test_seed_is_deterministic() {
        let one = deck("one", 6, 10, 20);
        let two = deck("two", 6, 10, 20);
        assert_eq!(
            setup_board(&one, &two, Some(42)).unwrap(),
            setup_board(&one, &two, Some(42)).unwrap()
        );
    }

    #[test]
    fn test_short_bench_when_few_basics() {
        let board = setup_board(&deck("one", 2, 10, 20), &deck("two", 6, 10, 20), Some(3)).unwrap();
        assert_eq!(board.player_one.bench.len(), 1);
    }

    #[test]
    fn test_deck_without_basic_is_rejected() {
        let result = setup_board(&deck("empty", 0, 10, 20), &deck("two", 6, 10, 20), Some(3));
        assert_eq!(result, Err(DeckError::NoBasicPokemon("empty".to_string())));
    }

    #[test]
    fn test_small_deck_is_rejected() {
        let result = setup_board(&deck("tiny", 1, 1, 0), &deck("two", 6, 10, 20), None);
        assert!(matches!(result, Err(DeckError::TooSmall { .. })));
    }
}
