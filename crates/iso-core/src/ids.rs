use core::fmt;
use core::num::NonZeroU32;

/// Position of a component or reaction in declaration order.
///
/// Stored off by one so `Option<Id>` costs nothing extra.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Declaration index, starting at 0.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Index as `usize`, for addressing per-component slices.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

pub type ComponentId = Id;
pub type ReactionId = Id;
