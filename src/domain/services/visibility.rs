//! Visibility projector
//!
//! The Player and Mentor reason under imperfect information: they get their
//! own zones in full and the opponent's public zones only. The Referee gets
//! everything.

use crate::domain::entities::{BoardState, CardCatalog, PlayerId};
use crate::domain::value_objects::{card_count_label, OpponentView, PlayerView, RefereeView};
use crate::domain::DataError;

/// Redacted view of the board for `player`
///
/// Fails fast if any card on the board does not resolve in the catalog.
pub fn project_view(board: &BoardState, player: PlayerId) -> Result<PlayerView, DataError> {
    board.validate()?;

    let own = board.player(player);
    let opponent = board.player(player.opponent());

    Ok(PlayerView {
        your_hand: own.clone(),
        opponent_hand: OpponentView {
            active: opponent.active.clone(),
            bench: opponent.bench.clone(),
            discard: opponent.discard.clone(),
            lost_zone: opponent.lost_zone.clone(),
            deck: card_count_label(opponent.deck.len()),
            hand: card_count_label(opponent.hand.len()),
            stadium: opponent.stadium,
            prize_cards: card_count_label(opponent.prize_cards.len()),
        },
    })
}

/// Full board from `player`'s seat, for adjudication
pub fn referee_view(board: &BoardState, player: PlayerId) -> RefereeView {
    RefereeView {
        your_hand: board.player(player).clone(),
        opponent_hand: board.player(player.opponent()).clone(),
    }
}

/// Catalog entries for the cards a view exposes
pub fn catalog_for_view(view: &PlayerView, catalog: &CardCatalog) -> CardCatalog {
    catalog.subset(view.visible_card_ids())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        CardCategory, CardDefinition, CardId, CardRef, PlayerState, PokemonInPlay,
    };

    fn definition(name: &str) -> CardDefinition {
        CardDefinition {
            name: name.to_string(),
            supertype: CardCategory::Pokemon,
            subtypes: vec!["Basic".to_string()],
            hp: Some("70".to_string()),
            details: Default::default(),
        }
    }

    fn board() -> BoardState {
        let catalog: CardCatalog = (0..40)
            .map(|i| (CardId(i), definition(&format!("card-{}", i))))
            .collect();

        let one = PlayerState {
            active: Some(PokemonInPlay::new(0, 70)),
            hand: vec![CardRef::new(1), CardRef::new(2)],
            deck: vec![CardRef::new(3)],
            prize_cards: vec![CardRef::new(4)],
            ..Default::default()
        };
        let two = PlayerState {
            active: Some(PokemonInPlay::new(20, 120).with_attached(vec![CardRef::new(21)])),
            bench: vec![PokemonInPlay::new(22, 60)],
            discard: vec![CardRef::new(23)],
            lost_zone: vec![CardRef::new(24)],
            hand: vec![CardRef::new(25), CardRef::new(26), CardRef::new(27)],
            deck: (28..38).map(CardRef::new).collect(),
            stadium: Some(CardRef::new(38)),
            prize_cards: vec![CardRef::new(39)],
        };
        BoardState::new(one, two, catalog)
    }

    #[test]
    fn test_own_zones_pass_through() {
        let board = board();
        let view = project_view(&board, PlayerId::One).unwrap();
        assert_eq!(view.your_hand, board.player_one);
    }

    #[test]
    fn test_opponent_hidden_zones_become_counts() {
        let board = board();
        let view = project_view(&board, PlayerId::One).unwrap();

        assert_eq!(view.opponent_hand.hand, "3 cards");
        assert_eq!(view.opponent_hand.deck, "10 cards");
        assert_eq!(view.opponent_hand.prize_cards, "1 card");
        assert_eq!(view.opponent_hand.active, board.player_two.active);
        assert_eq!(view.opponent_hand.bench, board.player_two.bench);
        assert_eq!(view.opponent_hand.stadium, Some(CardRef::new(38)));
    }

    #[test]
    fn test_view_never_leaks_hidden_ids() {
        let board = board();
        for player in [PlayerId::One, PlayerId::Two] {
            let view = project_view(&board, player).unwrap();
            let json = serde_json::to_value(&view.opponent_hand).unwrap().to_string();
            let opponent = board.player(player.opponent());

            for card in opponent
                .hand
                .iter()
                .chain(opponent.deck.iter())
                .chain(opponent.prize_cards.iter())
            {
                assert!(!view.visible_card_ids().contains(&card.id));
                assert!(!json.contains(&format!("\"id\":{}", card.id)));
            }
        }
    }

    #[test]
    fn test_catalog_for_view_excludes_hidden_cards() {
        let board = board();
        let view = project_view(&board, PlayerId::One).unwrap();
        let catalog = catalog_for_view(&view, &board.card_map);

        assert!(catalog.contains(CardId(1)));
        assert!(catalog.contains(CardId(21)));
        assert!(!catalog.contains(CardId(25)));
        assert!(!catalog.contains(CardId(30)));
    }

    #[test]
    fn test_unknown_card_fails_fast() {
        let mut board = board();
        board.player_two.hand.push(CardRef::new(400));
        assert_eq!(
            project_view(&board, PlayerId::One),
            Err(DataError::UnknownCard(CardId(400)))
        );
    }

    #[test]
    fn test_referee_view_is_complete() {
        let board = board();
        let view = referee_view(&board, PlayerId::Two);
        assert_eq!(view.your_hand, board.player_two);
        assert_eq!(view.opponent_hand, board.player_one);
    }
}
