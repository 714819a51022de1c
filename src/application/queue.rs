use crate::domain::trip::TripId;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// A queued trip together with the sequence number it was enqueued under.
///
/// The sequence number is the trip's place in line; handing the entry back
/// to [`DispatchQueue::requeue`] restores it to exactly that place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEntry {
    pub seq: u64,
    pub trip: TripId,
}

#[derive(Debug, Default)]
struct QueueState {
    next_seq: u64,
    // Sorted by `seq`, oldest at the front.
    entries: VecDeque<PendingEntry>,
}

/// FIFO of trips waiting for a driver.
///
/// Every operation runs under one short-lived lock, so an entry is handed
/// out by [`DispatchQueue::dequeue_next`] to at most one caller.
#[derive(Debug, Default)]
pub struct DispatchQueue {
    state: Mutex<QueueState>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, trip: TripId) -> PendingEntry {
        let mut state = self.state.lock().await;
        let entry = PendingEntry {
            seq: state.next_seq,
            trip,
        };
        state.next_seq += 1;
        state.entries.push_back(entry);
        entry
    }

    /// Removes and returns the oldest pending entry.
    pub async fn dequeue_next(&self) -> Option<PendingEntry> {
        self.state.lock().await.entries.pop_front()
    }

    /// Puts a previously dequeued entry back at its original position,
    /// ahead of everything enqueued after it.
    pub async fn requeue(&self, entry: PendingEntry) {
        let mut state = self.state.lock().await;
        match state.entries.binary_search_by_key(&entry.seq, |e| e.seq) {
            Ok(_) => {}
            Err(position) => state.entries.insert(position, entry),
        }
    }

    /// Drops `trip` from the queue. Returns `false` if it was not pending.
    pub async fn remove(&self, trip: TripId) -> bool {
        let mut state = self.state.lock().await;
        match state.entries.iter().position(|e| e.trip == trip) {
            Some(position) => {
                state.entries.remove(position);
                true
            }
            None => false,
        }
    }

    /// Pending trips, oldest first.
    pub async fn snapshot(&self) -> Vec<TripId> {
        let state = self.state.lock().await;
        state.entries.iter().map(|e| e.trip).collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
