//! Chance and Community Chest decks.

use crate::board::Money;
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Which deck a card belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckKind {
    Chance,
    CommunityChest,
}

/// Target of an "advance to the nearest ..." card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NearestKind {
    Station,
    Utility,
}

/// What a card does when applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardEffect {
    /// Move forward to a board index, collecting the GO salary when passing
    /// GO if `collect_go` is set
    MoveTo { index: u8, collect_go: bool },
    /// Move by a signed number of spaces (backward moves never pass GO)
    MoveRelative(i8),
    Collect(Money),
    Pay(Money),
    /// Every other player pays this amount to the drawer
    CollectFromEach(Money),
    /// The drawer pays this amount to every other player
    PayEach(Money),
    /// Levy per house and per hotel owned
    StreetRepairs { per_house: Money, per_hotel: Money },
    GoToJail,
    /// Keep a "get out of jail free" card
    JailFree,
    /// Advance to the nearest station or utility; an owner collects the
    /// boosted rent
    MoveToNearest(NearestKind),
}

/// A single card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub deck: DeckKind,
    pub text: String,
    pub effect: CardEffect,
}

impl Card {
    fn new(deck: DeckKind, id: &str, text: &str, effect: CardEffect) -> Self {
        Self {
            id: id.to_string(),
            deck,
            text: text.to_string(),
            effect,
        }
    }

    /// The 16 chance cards in printed order
    pub fn chance_cards() -> Vec<Card> {
        use CardEffect::*;
        let c = |id, text, effect| Card::new(DeckKind::Chance, id, text, effect);

        vec![
            c("ch_go", "Advance to GO (Collect $200)", MoveTo { index: 0, collect_go: true }),
            c("ch_illinois", "Advance to Illinois Avenue. If you pass GO, collect $200", MoveTo { index: 24, collect_go: true }),
            c("ch_st_charles", "Advance to St. Charles Place. If you pass GO, collect $200", MoveTo { index: 11, collect_go: true }),
            c("ch_utility", "Advance to the nearest Utility. If owned, pay owner 10 times the amount thrown", MoveToNearest(NearestKind::Utility)),
            c("ch_railroad_1", "Advance to the nearest Railroad. If owned, pay owner twice the rental", MoveToNearest(NearestKind::Station)),
            c("ch_railroad_2", "Advance to the nearest Railroad. If owned, pay owner twice the rental", MoveToNearest(NearestKind::Station)),
            c("ch_dividend", "Bank pays you dividend of $50", Collect(50)),
            c("ch_jail_free", "Get Out of Jail Free", JailFree),
            c("ch_back_3", "Go Back 3 Spaces", MoveRelative(-3)),
            c("ch_jail", "Go to Jail. Go directly to Jail, do not pass GO, do not collect $200", GoToJail),
            c("ch_repairs", "Make general repairs on all your property. For each house pay $25. For each hotel pay $100", StreetRepairs { per_house: 25, per_hotel: 100 }),
            c("ch_speeding", "Speeding fine $15", Pay(15)),
            c("ch_reading", "Take a trip to Reading Railroad. If you pass GO, collect $200", MoveTo { index: 5, collect_go: true }),
            c("ch_boardwalk", "Advance to Boardwalk", MoveTo { index: 39, collect_go: true }),
            c("ch_chairman", "You have been elected Chairman of the Board. Pay each player $50", PayEach(50)),
            c("ch_building_loan", "Your building loan matures. Collect $150", Collect(150)),
        ]
    }

    /// The 16 community chest cards in printed order
    pub fn community_chest_cards() -> Vec<Card> {
        use CardEffect::*;
        let c = |id, text, effect| Card::new(DeckKind::CommunityChest, id, text, effect);

        vec![
            c("cc_go", "Advance to GO (Collect $200)", MoveTo { index: 0, collect_go: true }),
            c("cc_bank_error", "Bank error in your favor. Collect $200", Collect(200)),
            c("cc_doctor", "Doctor's fee. Pay $50", Pay(50)),
            c("cc_stock_sale", "From sale of stock you get $50", Collect(50)),
            c("cc_jail_free", "Get Out of Jail Free", JailFree),
            c("cc_jail", "Go to Jail. Go directly to jail, do not pass GO, do not collect $200", GoToJail),
            c("cc_holiday", "Holiday fund matures. Receive $100", Collect(100)),
            c("cc_tax_refund", "Income tax refund. Collect $20", Collect(20)),
            c("cc_birthday", "It is your birthday. Collect $10 from every player", CollectFromEach(10)),
            c("cc_life_insurance", "Life insurance matures. Collect $100", Collect(100)),
            c("cc_hospital", "Hospital fees. Pay $100", Pay(100)),
            c("cc_school", "School fees. Pay $50", Pay(50)),
            c("cc_consultancy", "Receive $25 consultancy fee", Collect(25)),
            c("cc_repairs", "You are assessed for street repairs. $40 per house. $115 per hotel", StreetRepairs { per_house: 40, per_hotel: 115 }),
            c("cc_beauty", "You have won second prize in a beauty contest. Collect $10", Collect(10)),
            c("cc_inheritance", "You inherit $100", Collect(100)),
        ]
    }
}

/// Fisher-Yates shuffle driven by an injectable source
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

/// A circular draw pile: drawing takes the front card and puts it at the back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub kind: DeckKind,
    cards: VecDeque<Card>,
}

impl Deck {
    /// A deck in the given order
    pub fn new(kind: DeckKind, cards: Vec<Card>) -> Self {
        Self {
            kind,
            cards: cards.into(),
        }
    }

    /// The standard deck of `kind`, shuffled
    pub fn shuffled<R: RandomSource + ?Sized>(kind: DeckKind, rng: &mut R) -> Self {
        let mut cards = match kind {
            DeckKind::Chance => Card::chance_cards(),
            DeckKind::CommunityChest => Card::community_chest_cards(),
        };
        shuffle(&mut cards, rng);
        Self::new(kind, cards)
    }

    /// Draw the top card; it goes back in at the bottom
    pub fn draw(&mut self) -> Option<Card> {
        let card = self.cards.pop_front()?;
        self.cards.push_back(card.clone());
        Some(card)
    }

    /// The card that would be drawn next
    pub fn peek(&self) -> Option<&Card> {
        self.cards.front()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Put a specific card on top (used by tests and scripted scenarios)
    pub fn stack_on_top(&mut self, card_id: &str) -> bool {
        match self.cards.iter().position(|c| c.id == card_id) {
            Some(pos) => {
                if let Some(card) = self.cards.remove(pos) {
                    self.cards.push_front(card);
                }
                true
            }
            None => false,
        }
    }
}
