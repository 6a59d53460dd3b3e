//! Value transitions produced by change detection

/// Old and new value of a single field for one update call
///
/// Ephemeral: describes the reservation transition to apply, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange<T> {
    /// Value recorded when the entity was loaded
    pub old_value: T,
    /// Value that will be persisted
    pub new_value: T,
}

impl<T> PropertyChange<T> {
    /// Create a new property change
    pub fn new(old_value: T, new_value: T) -> Self {
        Self {
            old_value,
            new_value,
        }
    }

    /// Apply `f` to both sides
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PropertyChange<U> {
        PropertyChange {
            old_value: f(self.old_value),
            new_value: f(self.new_value),
        }
    }
}

impl<T: PartialEq> PropertyChange<T> {
    /// Check if old and new are equal
    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}
