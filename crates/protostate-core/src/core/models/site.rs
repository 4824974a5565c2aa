use std::ops::RangeInclusive;

/// One titratable group: an inclusive block of global instance indices and the instance
/// currently selected from it.
///
/// The bounds are fixed once the site is created; only the active index moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Site {
    first: usize,
    last: usize,
    active: usize,
}

impl Site {
    /// Creates a site covering `first..=last`, active on `first`.
    ///
    /// Returns `None` when the range is empty (`first > last`).
    pub fn new(first: usize, last: usize) -> Option<Self> {
        (first <= last).then_some(Self {
            first,
            last,
            active: first,
        })
    }

    pub(crate) fn spanning(first: usize, count: usize) -> Self {
        Self {
            first,
            last: first + count - 1,
            active: first,
        }
    }

    #[inline]
    pub fn first(&self) -> usize {
        self.first
    }

    #[inline]
    pub fn last(&self) -> usize {
        self.last
    }

    #[inline]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Number of candidate instances, i.e. the radix of this digit.
    #[inline]
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// A site always holds at least one instance.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    #[inline]
    pub fn contains(&self, instance: usize) -> bool {
        self.range().contains(&instance)
    }

    /// Offset of the active instance inside the site's block.
    #[inline]
    pub fn offset(&self) -> usize {
        self.active - self.first
    }

    /// Selects `instance` as the active one. Returns `false`, leaving the site untouched, if
    /// the instance does not belong to this site.
    pub fn set_active(&mut self, instance: usize) -> bool {
        if self.contains(instance) {
            self.active = instance;
            true
        } else {
            false
        }
    }

    pub fn same_block_as(&self, other: &Site) -> bool {
        self.first == other.first && self.last == other.last
    }

    #[inline]
    pub(crate) fn reset(&mut self) {
        self.active = self.first;
    }

    #[inline]
    pub(crate) fn set_offset(&mut self, offset: usize) {
        self.active = self.first + offset;
    }

    /// Moves to the next instance. Returns `true` when the digit overflowed and wrapped back to
    /// `first`, meaning the carry must propagate to the next site.
    #[inline]
    pub(crate) fn advance(&mut self) -> bool {
        if self.active < self.last {
            self.active += 1;
            false
        } else {
            self.active = self.first;
            true
        }
    }
}
