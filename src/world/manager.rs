//! The map registry and the visitation stack.
//!
//! [`MapManager`] is the one authority on which map is active. It owns every
//! map for the whole session, so leaving a map never loses its state, and
//! decides push versus pop when the player crosses a transition tile.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::maps::{Map, WorldSignal};
use super::stack::VisitationStack;
use super::tiles::TilePolicy;
use crate::shared::*;

/// A destination that can only be entered while holding an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryGate {
    pub map: MapId,
    pub required: ItemId,
}

#[derive(Debug)]
pub enum MapSlot {
    Ready(Map),
    /// Registered but its content could not be loaded.
    Unavailable { reason: String },
}

/// Per-map progress that outlives a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapProgress {
    pub map: MapId,
    pub completed: bool,
    pub npc_done: bool,
}

/// Everything needed to rebuild navigation state from a save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationSnapshot {
    /// Bottom to top.
    pub stack: Vec<MapId>,
    pub progress: Vec<MapProgress>,
}

#[derive(Resource, Debug, Default)]
pub struct MapManager {
    slots: Vec<MapSlot>,
    stack: VisitationStack,
    gates: Vec<EntryGate>,
    policy: TilePolicy,
    signals: Vec<WorldSignal>,
}

impl MapManager {
    pub fn new(policy: TilePolicy) -> Self {
        Self {
            policy,
            ..default()
        }
    }

    pub fn with_gates(mut self, gates: Vec<EntryGate>) -> Self {
        self.gates = gates;
        self
    }

    /// Register a map under its own id. Gaps below it become unavailable.
    pub fn insert(&mut self, map: Map) {
        if let Some(index) = map.id().index() {
            self.ensure_slot(index);
            self.slots[index] = MapSlot::Ready(map);
        }
    }

    pub fn mark_unavailable(&mut self, id: MapId, reason: impl Into<String>) {
        if let Some(index) = id.index() {
            self.ensure_slot(index);
            self.slots[index] = MapSlot::Unavailable {
                reason: reason.into(),
            };
        }
    }

    fn ensure_slot(&mut self, index: usize) {
        while self.slots.len() <= index {
            self.slots.push(MapSlot::Unavailable {
                reason: "not registered".to_string(),
            });
        }
    }

    pub fn registered_count(&self) -> usize {
        self.slots.len()
    }

    pub fn policy(&self) -> &TilePolicy {
        &self.policy
    }

    pub fn stack(&self) -> &VisitationStack {
        &self.stack
    }

    pub fn map(&self, id: MapId) -> Option<&Map> {
        match self.slots.get(id.index()?)? {
            MapSlot::Ready(map) => Some(map),
            MapSlot::Unavailable { .. } => None,
        }
    }

    pub fn map_mut(&mut self, id: MapId) -> Option<&mut Map> {
        match self.slots.get_mut(id.index()?)? {
            MapSlot::Ready(map) => Some(map),
            MapSlot::Unavailable { .. } => None,
        }
    }

    pub fn current_id(&self) -> Option<MapId> {
        self.stack.top()
    }

    pub fn current(&self) -> Option<&Map> {
        self.map(self.stack.top()?)
    }

    pub fn current_mut(&mut self) -> Option<&mut Map> {
        let id = self.stack.top()?;
        self.map_mut(id)
    }

    /// The active map has reached its narrative terminal.
    pub fn is_done_game(&self) -> bool {
        self.current().is_some_and(Map::is_completed)
    }

    /// Make `target` the active map: back to it if it is already on the
    /// path, on top of the path otherwise. False, with nothing changed, for
    /// unregistered or unavailable maps.
    pub fn request_map_change(&mut self, target: MapId) -> bool {
        let Some(index) = target.index().filter(|i| *i < self.slots.len()) else {
            return false;
        };
        if let MapSlot::Unavailable { reason } = &self.slots[index] {
            warn!("[World] {} is unavailable: {}", target, reason);
            return false;
        }

        match self.stack.unwind_to(target) {
            Some(popped) => debug!("[World] Back to {} ({} popped)", target, popped),
            None => self.stack.push(target),
        }
        true
    }

    /// One frame on the active map, then any transition it asked for.
    pub fn advance(
        &mut self,
        delta: Duration,
        actor: &mut dyn ActorState,
        input: &PlayerInput,
        world_frozen: bool,
    ) {
        let Some(current) = self.stack.top() else {
            return;
        };

        let request = match current.index().and_then(|i| self.slots.get_mut(i)) {
            Some(MapSlot::Ready(map)) => {
                let request = map.frame_update(delta, actor, input, &self.policy);
                self.signals.extend(map.drain_signals());
                request
            }
            _ => None,
        };

        if let Some(target) = request {
            self.transition(current, target, actor);
        }

        if let Some(map) = self.current_mut() {
            map.set_frozen(world_frozen);
        }
    }

    fn transition(&mut self, from: MapId, target: MapId, actor: &mut dyn ActorState) -> bool {
        if let Some(gate) = self.gates.iter().find(|gate| gate.map == target) {
            if !actor.has_item(&gate.required) {
                info!("[World] {} is locked: requires {}", target, gate.required);
                self.signals.push(WorldSignal::Locked {
                    target,
                    required: gate.required.clone(),
                });
                return false;
            }
        }

        if !self.request_map_change(target) {
            return false;
        }

        let arrival = self
            .map(target)
            .map_or(GridLocation::NONE, |map| map.find_link(from));
        if arrival.is_valid() {
            actor.set_location(arrival);
        } else {
            warn!("[World] {} has no link back to {}", target, from);
        }

        info!("[World] {} -> {} at {}", from, target, actor.location());
        self.signals.push(WorldSignal::Entered {
            from,
            to: target,
            arrival: actor.location(),
        });
        true
    }

    /// Animation only, for when nobody is playing (the epilogue).
    pub fn ambient_update(&mut self, delta: Duration) {
        if let Some(map) = self.current_mut() {
            map.ambient_update(delta);
        }
    }

    /// Restart the path at the epilogue map. Freezing is left to the caller.
    pub fn enter_epilogue(&mut self, epilogue: MapId) -> bool {
        if self.map(epilogue).is_none() {
            warn!("[World] Epilogue {} is unavailable", epilogue);
            return false;
        }
        self.stack.clear();
        self.stack.push(epilogue);
        if let Some(map) = self.current_mut() {
            map.reset_transient();
        }
        true
    }

    /// Engine-wide reset: empty path, every map back to its fresh state.
    pub fn reset_progress(&mut self) {
        self.stack.clear();
        self.signals.clear();
        for slot in &mut self.slots {
            if let MapSlot::Ready(map) = slot {
                map.reset_transient();
                map.restore_progress(false, false);
            }
        }
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        let progress = self
            .slots
            .iter()
            .filter_map(|slot| match slot {
                MapSlot::Ready(map) => Some(MapProgress {
                    map: map.id(),
                    completed: map.is_completed(),
                    npc_done: map.npc_done(),
                }),
                MapSlot::Unavailable { .. } => None,
            })
            .collect();
        NavigationSnapshot {
            stack: self.stack.iter().collect(),
            progress,
        }
    }

    /// Replace navigation state with a snapshot. Nothing changes if the
    /// snapshot names a map this registry cannot serve.
    pub fn restore(&mut self, snapshot: &NavigationSnapshot) -> Result<(), String> {
        let named = snapshot
            .stack
            .iter()
            .chain(snapshot.progress.iter().map(|p| &p.map));
        for id in named {
            if self.map(*id).is_none() {
                return Err(format!("snapshot names unknown map {}", id));
            }
        }
        if snapshot.stack.is_empty() {
            return Err("snapshot has an empty stack".to_string());
        }

        self.reset_progress();
        for progress in &snapshot.progress {
            if let Some(map) = self.map_mut(progress.map) {
                map.restore_progress(progress.completed, progress.npc_done);
            }
        }
        self.stack = snapshot.stack.iter().copied().collect();
        Ok(())
    }

    pub fn drain_signals(&mut self) -> Vec<WorldSignal> {
        std::mem::take(&mut self.signals)
    }
}
