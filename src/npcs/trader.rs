use bevy::prelude::*;
use std::time::Duration;

use super::{Npc, NpcTrade, NpcView, Price};
use crate::shared::*;
use crate::world::animation::AmbientAnimation;

/// How long the "was dropped" hint stays up after a trade.
const HINT_SECS: f32 = 6.0;

/// An NPC that trades once: while the player is talking to it and can pay,
/// it takes the price and hands over its rewards.
#[derive(Debug, Clone)]
pub struct TradeNpc {
    name: String,
    description: String,
    location: GridLocation,
    price: Price,
    rewards: Vec<ItemId>,
    interacting: bool,
    done: bool,
    idle: AmbientAnimation,
    hint_timer: Option<Timer>,
}

impl TradeNpc {
    pub fn new(
        name: &str,
        description: &str,
        location: GridLocation,
        price: Price,
        rewards: Vec<ItemId>,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            location,
            price,
            rewards,
            interacting: false,
            done: false,
            idle: AmbientAnimation::new(4, 0.75),
            hint_timer: None,
        }
    }

    fn can_pay(&self, actor: &dyn ActorState) -> bool {
        match &self.price {
            Price::Item(item_id) => actor.has_item(item_id),
            Price::Cash(amount) => actor.cash() >= *amount,
        }
    }

    fn pay(&self, actor: &mut dyn ActorState) {
        match &self.price {
            Price::Item(item_id) => {
                actor.remove_item(item_id);
            }
            Price::Cash(amount) => {
                let cash = actor.cash().saturating_sub(*amount);
                actor.set_cash(cash);
            }
        }
    }

    fn hint_text(&self) -> String {
        format!("{}\nwas dropped", self.rewards.join("\nand\n"))
    }
}

impl Npc for TradeNpc {
    fn name(&self) -> &str {
        &self.name
    }

    fn animate(&mut self, delta: Duration) {
        self.idle.tick(delta);

        if let Some(timer) = self.hint_timer.as_mut() {
            timer.tick(delta);
            if timer.finished() {
                self.hint_timer = None;
            }
        }
    }

    fn tick(&mut self, actor: &mut dyn ActorState) -> Option<NpcTrade> {
        if !self.interacting || self.done || !self.can_pay(actor) {
            return None;
        }

        self.pay(actor);
        for item_id in &self.rewards {
            actor.add_item(item_id);
        }
        self.done = true;
        self.hint_timer = Some(Timer::from_seconds(HINT_SECS, TimerMode::Once));
        info!("[Npc] {} traded {:?} for {:?}", self.name, self.price, self.rewards);

        Some(NpcTrade {
            npc_name: self.name.clone(),
            received: self.rewards.clone(),
        })
    }

    fn set_interacting(&mut self, interacting: bool) {
        self.interacting = interacting;
    }

    fn is_interacting(&self) -> bool {
        self.interacting
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    fn set_frozen(&mut self, frozen: bool) {
        if frozen {
            self.idle.pause();
        } else {
            self.idle.resume();
        }
    }

    fn view(&self) -> NpcView {
        NpcView {
            name: self.name.clone(),
            description: self.description.clone(),
            location: self.location,
            interacting: self.interacting,
            frame: self.idle.frame(),
            hint: self.hint_timer.as_ref().map(|_| self.hint_text()),
        }
    }
}
