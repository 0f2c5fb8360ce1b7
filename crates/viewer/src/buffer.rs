//! The two alternating display layers.

use morphgallery_protocol::GalleryItem;

/// Name of a display buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    /// The other buffer.
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// What a buffer currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    /// Waiting for the image requested under `generation`.
    Loading { generation: u64 },
    /// Showing a decoded image.
    Shown,
    /// Showing the failure placeholder for an image that did not decode.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    state: SlotState,
    index: Option<usize>,
    item: Option<GalleryItem>,
}

impl Slot {
    const EMPTY: Self = Self {
        state: SlotState::Empty,
        index: None,
        item: None,
    };

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    /// Gallery index of the image held (or being loaded).
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn item(&self) -> Option<&GalleryItem> {
        self.item.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.state == SlotState::Empty
    }

    /// Showing something, either the image or its placeholder.
    pub fn is_visible_content(&self) -> bool {
        matches!(self.state, SlotState::Shown | SlotState::Failed { .. })
    }
}

/// Two named slots with a single active tag.
///
/// Swapping flips the tag; slot contents are never copied between
/// buffers. Only the inactive slot is ever written while an image is
/// visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffers {
    a: Slot,
    b: Slot,
    active: Option<BufferId>,
}

impl Default for Buffers {
    fn default() -> Self {
        Self {
            a: Slot::EMPTY,
            b: Slot::EMPTY,
            active: None,
        }
    }
}

impl Buffers {
    /// The visible buffer, once any image has been shown.
    pub fn active(&self) -> Option<BufferId> {
        self.active
    }

    /// The buffer the next image loads into (A before anything is shown).
    pub fn inactive(&self) -> BufferId {
        self.active.map_or(BufferId::A, BufferId::other)
    }

    pub fn slot(&self, id: BufferId) -> &Slot {
        match id {
            BufferId::A => &self.a,
            BufferId::B => &self.b,
        }
    }

    fn slot_mut(&mut self, id: BufferId) -> &mut Slot {
        match id {
            BufferId::A => &mut self.a,
            BufferId::B => &mut self.b,
        }
    }

    /// Slot of the visible buffer.
    pub fn active_slot(&self) -> Option<&Slot> {
        self.active.map(|id| self.slot(id))
    }

    /// Starts loading `item` into the inactive buffer, replacing whatever
    /// load was pending there. Returns the buffer used.
    pub fn begin_load(&mut self, index: usize, item: GalleryItem, generation: u64) -> BufferId {
        let id = self.inactive();
        *self.slot_mut(id) = Slot {
            state: SlotState::Loading { generation },
            index: Some(index),
            item: Some(item),
        };
        id
    }

    /// Resolves the pending load in `id` and makes it the active buffer.
    ///
    /// `failure` switches the slot to the placeholder instead of the image.
    pub fn reveal(&mut self, id: BufferId, failure: Option<String>) {
        let slot = self.slot_mut(id);
        slot.state = match failure {
            None => SlotState::Shown,
            Some(reason) => SlotState::Failed { reason },
        };
        self.active = Some(id);
    }

    /// Empties both buffers.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> GalleryItem {
        GalleryItem {
            id: name.into(),
            name: name.into(),
            url: format!("http://gallery/uploads/{name}"),
            size: 1,
            mime: "image/png".into(),
        }
    }

    #[test]
    fn first_load_goes_to_a() {
        let mut buffers = Buffers::default();
        assert_eq!(buffers.active(), None);
        assert_eq!(buffers.begin_load(0, item("a.png"), 1), BufferId::A);
    }

    #[test]
    fn reveal_flips_active_tag() {
        let mut buffers = Buffers::default();
        let a = buffers.begin_load(0, item("a.png"), 1);
        buffers.reveal(a, None);
        assert_eq!(buffers.active(), Some(BufferId::A));
        assert_eq!(buffers.inactive(), BufferId::B);

        let b = buffers.begin_load(1, item("b.png"), 2);
        assert_eq!(b, BufferId::B);
        // Active layer keeps its image while B loads.
        assert_eq!(buffers.slot(BufferId::A).state(), &SlotState::Shown);

        buffers.reveal(b, Some("corrupt".into()));
        assert_eq!(buffers.active(), Some(BufferId::B));
        assert!(matches!(
            buffers.slot(BufferId::B).state(),
            SlotState::Failed { .. }
        ));
        assert_eq!(buffers.slot(BufferId::A).index(), Some(0));
    }

    #[test]
    fn clear_empties_both() {
        let mut buffers = Buffers::default();
        let a = buffers.begin_load(0, item("a.png"), 1);
        buffers.reveal(a, None);
        buffers.begin_load(1, item("b.png"), 2);

        buffers.clear();
        assert!(buffers.slot(BufferId::A).is_empty());
        assert!(buffers.slot(BufferId::B).is_empty());
        assert_eq!(buffers.active(), None);
    }
}
