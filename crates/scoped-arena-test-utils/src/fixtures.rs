//! Element fixtures for container tests.
//!
//! - [`DropCounter`] — counts how many values were dropped.
//! - [`Wide`] — a 32-byte aligned element for over-alignment tests.

use std::cell::Cell;
use std::rc::Rc;

/// Increments a shared counter when dropped.
///
/// Useful for checking that containers drawing from an arena still run
/// element destructors.
#[derive(Clone, Debug)]
pub struct DropCounter {
    pub value: u32,
    drops: Rc<Cell<usize>>,
}

impl DropCounter {
    /// A counter factory: every value made from the returned closure
    /// shares the returned drop tally.
    pub fn factory() -> (impl Fn(u32) -> DropCounter, Rc<Cell<usize>>) {
        let drops = Rc::new(Cell::new(0));
        let shared = Rc::clone(&drops);
        let make = move |value| DropCounter {
            value,
            drops: Rc::clone(&shared),
        };
        (make, drops)
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

/// Element whose alignment exceeds the platform's natural maximum.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(align(32))]
pub struct Wide(pub [f32; 8]);

impl Wide {
    pub fn splat(v: f32) -> Self {
        Self([v; 8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_counter_counts() {
        let (make, drops) = DropCounter::factory();
        let a = make(1);
        let b = a.clone();
        drop(a);
        drop(b);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn wide_is_over_aligned() {
        assert_eq!(std::mem::align_of::<Wide>(), 32);
        assert_eq!(std::mem::size_of::<Wide>(), 32);
    }
}
