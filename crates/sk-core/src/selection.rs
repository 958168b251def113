use crate::id::ElementId;
use smallvec::SmallVec;

/// Insertion-ordered set of selected element ids.
///
/// Most selections hold a handful of ids, so they stay inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: SmallVec<[ElementId; 4]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn as_slice(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.ids.iter().copied()
    }

    /// Returns `false` if the id was already selected.
    pub fn insert(&mut self, id: ElementId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: ElementId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|x| *x != id);
        self.ids.len() != before
    }

    /// Add the id if absent, remove it if present.
    pub fn toggle(&mut self, id: ElementId) {
        if !self.remove(id) {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn retain(&mut self, mut keep: impl FnMut(ElementId) -> bool) {
        self.ids.retain(|x| keep(*x));
    }
}

impl FromIterator<ElementId> for Selection {
    fn from_iter<I: IntoIterator<Item = ElementId>>(iter: I) -> Self {
        let mut sel = Selection::new();
        for id in iter {
            sel.insert(id);
        }
        sel
    }
}
