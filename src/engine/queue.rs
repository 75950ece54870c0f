use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::config::OverflowPolicy;

/// What happened to a frame offered to a full or non-full queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Queued after evicting the oldest pending frame
    DroppedOldest,
    /// Rejected; the queue is unchanged
    DroppedIncoming,
}

impl Admission {
    pub fn dropped_a_frame(&self) -> bool {
        !matches!(self, Self::Accepted)
    }
}

/// Bounded inbound frame queue of one session. Producer and consumer share
/// both channel ends so the producer can evict under `DropOldest`.
#[derive(Clone)]
pub struct FrameQueue {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    policy: OverflowPolicy,
    capacity: usize,
}

impl FrameQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            policy,
            capacity,
        }
    }

    pub fn push(&self, frame: Vec<u8>) -> Admission {
        let frame = match self.tx.try_send(frame) {
            Ok(()) => return Admission::Accepted,
            Err(TrySendError::Full(frame)) | Err(TrySendError::Disconnected(frame)) => frame,
        };

        match self.policy {
            OverflowPolicy::DropIncoming => Admission::DroppedIncoming,
            OverflowPolicy::DropOldest => {
                // The consumer may have made room in the meantime
                let evicted = self.rx.try_recv().is_ok();
                match self.tx.try_send(frame) {
                    Ok(()) if evicted => Admission::DroppedOldest,
                    Ok(()) => Admission::Accepted,
                    Err(_) => Admission::DroppedIncoming,
                }
            }
        }
    }

    pub fn pop(&self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Discard everything pending, returning how many frames were dropped
    pub fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> Vec<u8> {
        vec![tag]
    }

    #[test]
    fn test_accepts_until_full() {
        let queue = FrameQueue::new(2, OverflowPolicy::DropIncoming);
        assert_eq!(queue.push(frame(1)), Admission::Accepted);
        assert_eq!(queue.push(frame(2)), Admission::Accepted);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_drop_incoming_keeps_existing() {
        let queue = FrameQueue::new(2, OverflowPolicy::DropIncoming);
        queue.push(frame(1));
        queue.push(frame(2));
        assert_eq!(queue.push(frame(3)), Admission::DroppedIncoming);

        assert_eq!(queue.pop(), Some(frame(1)));
        assert_eq!(queue.pop(), Some(frame(2)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_drop_oldest_keeps_newest() {
        let queue = FrameQueue::new(2, OverflowPolicy::DropOldest);
        queue.push(frame(1));
        queue.push(frame(2));
        assert_eq!(queue.push(frame(3)), Admission::DroppedOldest);
        assert!(Admission::DroppedOldest.dropped_a_frame());

        assert_eq!(queue.pop(), Some(frame(2)));
        assert_eq!(queue.pop(), Some(frame(3)));
    }

    #[test]
    fn test_clear_counts_discarded() {
        let queue = FrameQueue::new(4, OverflowPolicy::DropOldest);
        for i in 0..3 {
            queue.push(frame(i));
        }
        assert_eq!(queue.clear(), 3);
        assert!(queue.is_empty());
    }
}
