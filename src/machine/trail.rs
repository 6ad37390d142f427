use crate::machine::{TermId, NodeKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct ChoicePoint {
    /// Length of the trail when the choice point was made
    trail_len: usize,
    /// Every term made at or after this id is younger than the choice point
    watermark: TermId,
}

/// The undo log of bindings, partitioned by the choice points that may need to undo them
#[derive(Debug, Clone, Default)]
pub struct Trail {
    entries: Vec<(TermId, NodeKind)>,
    choice_points: Vec<ChoicePoint>,
}

impl Trail {
    pub fn new() -> Trail {
        Trail::default()
    }
    /// How many choice points are open
    pub fn depth(&self) -> usize {
        self.choice_points.len()
    }
    /// How many bindings are recorded
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn new_choice_point(&mut self, watermark: TermId) {
        self.choice_points.push(ChoicePoint { trail_len: self.entries.len(), watermark });
    }
    /// Only terms older than the innermost choice point can be seen by it.
    /// Younger ones are unreachable once it backtracks, so writing them needs no entry
    pub fn needs_entry(&self, id: TermId) -> bool {
        match self.choice_points.last() {
            Some(choice) => id < choice.watermark,
            None => false,
        }
    }
    pub fn record(&mut self, id: TermId, previous: NodeKind) {
        self.entries.push((id, previous));
    }
    /// Undo every binding made since the innermost choice point, most recent first,
    /// and leave the choice point open
    pub fn restore_choice_point(&mut self, mut undo: impl FnMut(TermId, NodeKind)) {
        let choice = *self.choice_points.last()
            .expect("restore_choice_point without an open choice point");
        while self.entries.len() > choice.trail_len {
            if let Some((id, previous)) = self.entries.pop() {
                undo(id, previous);
            }
        }
    }
    /// Discard the innermost choice point, keeping its bindings.
    /// They stay on the trail so that an enclosing choice point can still undo them
    pub fn remove_choice_point(&mut self) {
        self.choice_points.pop()
            .expect("remove_choice_point without an open choice point");
    }
}
