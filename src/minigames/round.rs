use std::time::Duration;

use bevy::prelude::*;

use super::{Minigame, MinigameKind, MinigameOutcome, MinigamePhase, MinigameView};
use crate::shared::*;

/// Cash paid per point in the cafe.
const CAFE_PAY_PER_POINT: u32 = 5;
/// Points needed on the river to win a ticket.
const DUCK_TICKET_SCORE: u32 = 3;

/// Menu → Playing → Over round shared by both shipped minigames.
///
/// Activate starts the round and scores while playing; cancel ends it.
/// From the menu or the results screen either input closes the game.
#[derive(Debug, Clone)]
pub struct RoundMinigame {
    kind: MinigameKind,
    open: bool,
    phase: MinigamePhase,
    score: u32,
    elapsed: Duration,
}

impl RoundMinigame {
    pub fn new(kind: MinigameKind) -> Self {
        Self {
            kind,
            open: false,
            phase: MinigamePhase::Menu,
            score: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn payout(&self) -> Option<MinigameOutcome> {
        match self.kind {
            MinigameKind::CafeOrders if self.score > 0 => {
                Some(MinigameOutcome::Cash(self.score * CAFE_PAY_PER_POINT))
            }
            MinigameKind::DuckRiver if self.score >= DUCK_TICKET_SCORE => {
                Some(MinigameOutcome::Item(PRIZE_TICKET.to_string()))
            }
            _ => None,
        }
    }
}

impl Minigame for RoundMinigame {
    fn kind(&self) -> MinigameKind {
        self.kind
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) {
        self.open = true;
        self.phase = MinigamePhase::Menu;
        self.score = 0;
        self.elapsed = Duration::ZERO;
    }

    fn close(&mut self) {
        self.open = false;
        self.phase = MinigamePhase::Menu;
    }

    fn tick(&mut self, delta: Duration, input: &PlayerInput) -> Option<MinigameOutcome> {
        if !self.open {
            return None;
        }

        match self.phase {
            MinigamePhase::Menu => {
                if input.cancel {
                    self.close();
                } else if input.activate {
                    self.phase = MinigamePhase::Playing;
                }
                None
            }
            MinigamePhase::Playing => {
                self.elapsed += delta;
                if input.cancel {
                    self.phase = MinigamePhase::Over;
                    info!(
                        "[Minigame] {} round over: {} points in {:.1}s",
                        self.kind.title(),
                        self.score,
                        self.elapsed.as_secs_f32()
                    );
                    return self.payout();
                }
                if input.activate {
                    self.score += 1;
                }
                None
            }
            MinigamePhase::Over => {
                if input.activate || input.cancel {
                    self.close();
                }
                None
            }
        }
    }

    fn view(&self) -> MinigameView {
        MinigameView {
            title: self.kind.title(),
            phase: self.phase,
            score: self.score,
        }
    }
}
