use std::collections::VecDeque;

use crate::protocol::WriteIntent;

/// Writes issued while offline, replayed in order after reconnecting.
/// Unbounded.
#[derive(Clone, Debug, Default)]
pub struct PendingWrites {
    queue: VecDeque<WriteIntent>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, intent: WriteIntent) {
        self.queue.push_back(intent);
    }

    pub fn pop(&mut self) -> Option<WriteIntent> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The next write to replay. It stays queued until `pop`.
    pub fn front(&self) -> Option<&WriteIntent> {
        self.queue.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::grid::CellCoord;

    fn intent(x: u32) -> WriteIntent {
        WriteIntent::new(CellCoord::new(x, 0), Color::black())
    }

    #[test]
    fn drains_in_fifo_order() {
        let mut pending = PendingWrites::new();
        pending.push(intent(1));
        pending.push(intent(2));
        pending.push(intent(3));
        assert_eq!(pending.len(), 3);
        let order: Vec<u32> = std::iter::from_fn(|| pending.pop()).map(|w| w.x).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert!(pending.is_empty());
    }

    #[test]
    fn front_leaves_the_entry_queued() {
        let mut pending = PendingWrites::new();
        pending.push(intent(7));
        assert_eq!(pending.front().map(|w| w.x), Some(7));
        assert_eq!(pending.len(), 1);
    }
}
