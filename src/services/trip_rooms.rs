use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

/// One end of a live connection that can receive text frames.
#[async_trait(?Send)]
pub trait Listener: Clone + 'static {
    /// Returns false once the connection is gone.
    async fn deliver(&mut self, text: &str) -> bool;
}

#[async_trait(?Send)]
impl Listener for actix_ws::Session {
    async fn deliver(&mut self, text: &str) -> bool {
        self.text(text.to_string()).await.is_ok()
    }
}

/// Connections grouped by trip. Messages are relayed to whoever is connected
/// at the time; nothing is stored or retried.
pub struct TripRooms<L> {
    next_id: AtomicU64,
    rooms: Mutex<HashMap<String, Vec<(u64, L)>>>,
}

impl<L> Default for TripRooms<L> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl<L: Listener> TripRooms<L> {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, Vec<(u64, L)>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a connection and returns its handle for [`TripRooms::leave`].
    pub fn join(&self, trip_id: &str, listener: L) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rooms()
            .entry(trip_id.to_string())
            .or_default()
            .push((id, listener));
        log::debug!("Connection {} joined trip room {}", id, trip_id);
        id
    }

    pub fn leave(&self, trip_id: &str, connection: u64) {
        let mut rooms = self.rooms();
        if let Some(members) = rooms.get_mut(trip_id) {
            members.retain(|(id, _)| *id != connection);
            if members.is_empty() {
                rooms.remove(trip_id);
            }
        }
        log::debug!("Connection {} left trip room {}", connection, trip_id);
    }

    pub fn connection_count(&self, trip_id: &str) -> usize {
        self.rooms().get(trip_id).map_or(0, Vec::len)
    }

    /// Sends `text` to every connection in the room. Connections that fail
    /// delivery are dropped. Returns how many deliveries succeeded.
    pub async fn broadcast(&self, trip_id: &str, text: &str) -> usize {
        // Deliver from a snapshot so the lock is never held across an await.
        let members: Vec<(u64, L)> = match self.rooms().get(trip_id) {
            Some(members) => members.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, mut listener) in members {
            if listener.deliver(text).await {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        for id in dead {
            self.leave(trip_id, id);
        }
        delivered
    }
}
