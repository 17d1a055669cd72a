use crate::shared::MapId;

/// The path the player has taken, most recent map on top.
///
/// Holds map ids rather than maps, so popping never drops map state: the
/// registry owns every map for the whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitationStack {
    maps: Vec<MapId>,
}

impl VisitationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callers must check [`contains`](Self::contains) first; a map is never
    /// on the stack twice.
    pub fn push(&mut self, id: MapId) {
        debug_assert!(!self.contains(id), "{} already on the stack", id);
        self.maps.push(id);
    }

    pub fn pop(&mut self) -> Option<MapId> {
        self.maps.pop()
    }

    pub fn top(&self) -> Option<MapId> {
        self.maps.last().copied()
    }

    pub fn contains(&self, id: MapId) -> bool {
        self.maps.contains(&id)
    }

    pub fn clear(&mut self) {
        self.maps.clear();
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = MapId> + '_ {
        self.maps.iter().copied()
    }

    /// Pop until `id` is on top. Returns how many maps were popped, or
    /// `None` (and leaves the stack alone) if `id` is not on the stack.
    pub fn unwind_to(&mut self, id: MapId) -> Option<usize> {
        let position = self.maps.iter().rposition(|m| *m == id)?;
        let popped = self.maps.len() - position - 1;
        self.maps.truncate(position + 1);
        Some(popped)
    }
}

impl FromIterator<MapId> for VisitationStack {
    fn from_iter<I: IntoIterator<Item = MapId>>(iter: I) -> Self {
        let mut stack = Self::new();
        for id in iter {
            if !stack.contains(id) {
                stack.maps.push(id);
            }
        }
        stack
    }
}
