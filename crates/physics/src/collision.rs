//! Collider tagging and the per-frame collision event buffer.

use crate::error::PhysicsError;
use scene::Reference;
use std::collections::HashSet;

const PROBE_FLAG: u128 = 1 << 64;

/// Owner information packed into `Collider::user_data`.
///
/// Ordinary colliders carry only their owner's reference. Terrain probe boxes are owned by the
/// terrain they stand in for and also name the one object they may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColliderTag {
    pub owner: Reference,
    pub probe_for: Option<Reference>,
}

impl ColliderTag {
    pub fn owned_by(owner: Reference) -> Self {
        Self {
            owner,
            probe_for: None,
        }
    }

    /// Tag for a terrain probe box that only collides with `target`.
    pub fn probe(terrain: Reference, target: Reference) -> Self {
        Self {
            owner: terrain,
            probe_for: Some(target),
        }
    }

    pub fn is_probe(&self) -> bool {
        self.probe_for.is_some()
    }

    pub fn to_user_data(self) -> u128 {
        let mut bits = self.owner.0 as u128;
        if let Some(target) = self.probe_for {
            bits |= (target.0 as u128) << 32 | PROBE_FLAG;
        }
        bits
    }

    pub fn from_user_data(bits: u128) -> Self {
        let owner = Reference(bits as u32);
        let probe_for = (bits & PROBE_FLAG != 0).then(|| Reference((bits >> 32) as u32));
        Self { owner, probe_for }
    }
}

/// An unordered pair of objects that touched during the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub target: Reference,
    pub colliding: Reference,
}

impl CollisionEvent {
    /// The pair in a canonical order, for duplicate detection.
    fn key(&self) -> (Reference, Reference) {
        if self.target <= self.colliding {
            (self.target, self.colliding)
        } else {
            (self.colliding, self.target)
        }
    }
}

/// Collision pairs seen since the last [`EventBuffer::begin_frame`].
///
/// Recording is armed by `begin_frame` and disarmed by `drain`, so pairs are only gathered
/// while a consumer is waiting for them. Each unordered pair is kept once per frame.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<CollisionEvent>,
    seen: HashSet<(Reference, Reference)>,
    capacity: usize,
    armed: bool,
    dropped: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            seen: HashSet::new(),
            capacity,
            armed: false,
            dropped: 0,
        }
    }

    /// Clear the buffer and start recording.
    pub fn begin_frame(&mut self) {
        self.events.clear();
        self.seen.clear();
        self.dropped = 0;
        self.armed = true;
    }

    /// Take the frame's pairs and stop recording until the next `begin_frame`.
    pub fn drain(&mut self) -> Vec<CollisionEvent> {
        self.armed = false;
        self.seen.clear();
        std::mem::take(&mut self.events)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Record a pair. Returns `Ok(true)` if it was new, `Ok(false)` if recording is disarmed,
    /// the pair is a self-pair or it was already recorded this frame.
    pub fn record(&mut self, target: Reference, colliding: Reference) -> Result<bool, PhysicsError> {
        if !self.armed || target == colliding {
            return Ok(false);
        }
        let event = CollisionEvent { target, colliding };
        if self.seen.contains(&event.key()) {
            return Ok(false);
        }
        if self.events.len() >= self.capacity {
            self.dropped += 1;
            return Err(PhysicsError::EventBufferFull {
                capacity: self.capacity,
            });
        }
        self.seen.insert(event.key());
        self.events.push(event);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pairs refused this frame because the buffer was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
