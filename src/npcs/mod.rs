//! NPCs embedded in maps.
//!
//! A map holds at most one NPC. The map engine forwards held/released
//! interaction and ticks it; what the NPC wants and what it gives back is
//! decided here, always through the injected [`ActorState`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::shared::*;

mod trader;

pub use trader::TradeNpc;

/// Something an NPC handed over this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcTrade {
    pub npc_name: String,
    pub received: Vec<ItemId>,
}

/// Render-side snapshot of an NPC.
#[derive(Debug, Clone, PartialEq)]
pub struct NpcView {
    pub name: String,
    pub description: String,
    pub location: GridLocation,
    pub interacting: bool,
    pub frame: usize,
    /// Shown for a few seconds after a trade.
    pub hint: Option<String>,
}

pub trait Npc: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    /// Idle loop and hint timers only.
    fn animate(&mut self, delta: Duration);
    /// Reward logic; runs while the map is interactive.
    fn tick(&mut self, actor: &mut dyn ActorState) -> Option<NpcTrade>;
    fn set_interacting(&mut self, interacting: bool);
    fn is_interacting(&self) -> bool;
    /// The NPC's one-off task has been completed.
    fn is_done(&self) -> bool;
    fn set_done(&mut self, done: bool);
    fn set_frozen(&mut self, frozen: bool);
    fn view(&self) -> NpcView;
}

/// What an NPC asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Price {
    Item(ItemId),
    Cash(u32),
}

/// Config-side description of an NPC, placed on a map at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSpec {
    pub map: MapId,
    pub name: String,
    pub description: String,
    pub location: GridLocation,
    pub price: Price,
    pub rewards: Vec<ItemId>,
}

impl NpcSpec {
    pub fn build(&self) -> Box<dyn Npc> {
        Box::new(TradeNpc::new(
            &self.name,
            &self.description,
            self.location,
            self.price.clone(),
            self.rewards.clone(),
        ))
    }
}

/// The two townsfolk of the shipped story.
pub fn default_npcs() -> Vec<NpcSpec> {
    vec![
        NpcSpec {
            map: MapId(1),
            name: "Blue [Thief]".into(),
            description: "Loves money!\nSomething may\nhappen if you\nprovide him with\nenough of it...".into(),
            location: GridLocation::new(21, 7),
            price: Price::Cash(100),
            rewards: vec![ARCADE_TOKEN.into(), BLUE_HEART.into()],
        },
        NpcSpec {
            map: MapId(4),
            name: "Calicat [Cat]".into(),
            description: "Hardcore Gamer\nLoves winning\nprizes from\nthe arcade...".into(),
            location: GridLocation::new(7, 6),
            price: Price::Item(TEDDY_BEAR.into()),
            rewards: vec![RED_HEART.into()],
        },
    ]
}
