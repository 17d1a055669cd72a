//! Minigames embedded in maps.
//!
//! The map engine only ever sees the [`Minigame`] lifecycle surface: open,
//! tick while open, report a payout, close. What happens inside a round is
//! the minigame's own business.

use std::fmt;
use std::time::Duration;

use crate::shared::*;

mod round;

pub use round::RoundMinigame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinigameKind {
    CafeOrders,
    DuckRiver,
}

impl MinigameKind {
    /// Parse the name stored in a map file's metadata line.
    pub fn from_metadata(name: &str) -> Option<Self> {
        match name.trim() {
            "Cafe Orders" => Some(MinigameKind::CafeOrders),
            "DuckGame" => Some(MinigameKind::DuckRiver),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MinigameKind::CafeOrders => "Cafe Orders",
            MinigameKind::DuckRiver => "Duck River",
        }
    }

    pub fn build(self) -> Box<dyn Minigame> {
        Box::new(RoundMinigame::new(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinigamePhase {
    Menu,
    Playing,
    Over,
}

/// What a finished round pays the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinigameOutcome {
    Cash(u32),
    Item(ItemId),
}

impl MinigameOutcome {
    pub fn apply(&self, actor: &mut dyn ActorState) {
        match self {
            MinigameOutcome::Cash(amount) => {
                let cash = actor.cash().saturating_add(*amount);
                actor.set_cash(cash);
            }
            MinigameOutcome::Item(item_id) => actor.add_item(item_id),
        }
    }
}

/// Render-side snapshot of an open minigame.
#[derive(Debug, Clone, PartialEq)]
pub struct MinigameView {
    pub title: &'static str,
    pub phase: MinigamePhase,
    pub score: u32,
}

pub trait Minigame: fmt::Debug + Send + Sync {
    fn kind(&self) -> MinigameKind;
    fn is_open(&self) -> bool;
    fn open(&mut self);
    fn close(&mut self);
    /// Advance one frame. Returns the payout on the frame a round ends.
    fn tick(&mut self, delta: Duration, input: &PlayerInput) -> Option<MinigameOutcome>;
    fn view(&self) -> MinigameView;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_names() {
        assert_eq!(MinigameKind::from_metadata("Cafe Orders"), Some(MinigameKind::CafeOrders));
        assert_eq!(MinigameKind::from_metadata(" DuckGame "), Some(MinigameKind::DuckRiver));
        assert_eq!(MinigameKind::from_metadata("Chess"), None);
        assert_eq!(MinigameKind::from_metadata(""), None);
    }

    #[test]
    fn test_built_minigame_starts_closed() {
        let game = MinigameKind::DuckRiver.build();
        assert!(!game.is_open());
        assert_eq!(game.kind(), MinigameKind::DuckRiver);
    }
}
