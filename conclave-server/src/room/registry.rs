use conclave_core::{ParticipantId, RoomId};
use dashmap::DashMap;
use tracing::{debug, info};

/// Process-wide map of room membership.
///
/// Member lists keep join order; nothing downstream relies on that order
/// beyond the `existing-users` enumeration sent to a joiner. All mutation of
/// one room happens under that room's map entry, so interleaved joins and
/// leaves linearize per room without any global lock.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Vec<ParticipantId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Adds `participant` to `room`, creating the room if needed.
    ///
    /// Returns the membership as it was before the add, so the caller never
    /// sees itself in the snapshot. The snapshot is also the exact set of
    /// members that must be told about the join.
    pub fn join(&self, room: &RoomId, participant: ParticipantId) -> Vec<ParticipantId> {
        let mut members = self.rooms.entry(room.clone()).or_insert_with(Vec::new);
        if members.is_empty() {
            info!(%room, "room created");
        }
        let existing: Vec<ParticipantId> = members
            .iter()
            .filter(|m| **m != participant)
            .cloned()
            .collect();
        if !members.contains(&participant) {
            members.push(participant);
        }
        existing
    }

    /// Removes `participant` from `room` and returns the remaining members —
    /// the set that must be told about the departure. Leaving a room that
    /// does not exist is a no-op; an emptied room is deleted.
    pub fn leave(&self, room: &RoomId, participant: &ParticipantId) -> Vec<ParticipantId> {
        let remaining = match self.rooms.get_mut(room) {
            Some(mut members) => {
                members.retain(|m| m != participant);
                members.clone()
            }
            None => {
                debug!(%room, "leave on absent room");
                return Vec::new();
            }
        };

        if remaining.is_empty() {
            // Re-checked under the entry lock: a concurrent join wins.
            if self.rooms.remove_if(room, |_, members| members.is_empty()).is_some() {
                info!(%room, "room deleted");
            }
        }

        remaining
    }

    /// Current membership snapshot, in join order.
    pub fn members(&self, room: &RoomId) -> Vec<ParticipantId> {
        self.rooms
            .get(room)
            .map(|members| members.clone())
            .unwrap_or_default()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
