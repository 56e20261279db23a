//! `StopCursor` — the owned, monotonic position of a trip in its stop list.

/// Position within a trip's stop sequence.
///
/// The index never decreases.  `done` is set when the index reaches the last
/// stop and is terminal: a done cursor refuses every further advance and
/// every resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StopCursor {
    index: usize,
    len:   usize,
    done:  bool,
}

impl StopCursor {
    /// Cursor at index 0 of a `len`-stop sequence.  Returns `None` for an
    /// empty sequence; a single-stop sequence is done immediately.
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { index: 0, len, done: len == 1 })
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Index of the stop after the current one, if any.
    #[inline]
    pub fn next_index(&self) -> Option<usize> {
        (self.index + 1 < self.len).then_some(self.index + 1)
    }

    /// Move one stop forward.  Returns the new index, or `None` when the
    /// cursor is already done.
    pub fn advance(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        self.index += 1;
        self.done = self.index + 1 == self.len;
        Some(self.index)
    }

    /// Change the length of the sequence behind the cursor.  The current
    /// index must stay in range.  Returns `false` (and changes nothing) when
    /// the cursor is done or `len` would cut off the current stop.
    pub(crate) fn resize(&mut self, len: usize) -> bool {
        if self.done || len <= self.index {
            return false;
        }
        self.len = len;
        self.done = self.index + 1 == len;
        true
    }
}
