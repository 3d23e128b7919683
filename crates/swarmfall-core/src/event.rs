//! Synchronous publish/subscribe channel.
//!
//! Systems publish [`GameEvent`]s to the [`EventBus`]; listeners registered
//! by the host (HUD, audio, scripted tests) receive them synchronously in
//! registration order. Every published event is also appended to a per-frame
//! log that systems later in the same frame read, which is how Combat sees
//! this frame's collisions and how the spawn manager sees this frame's kills.
//!
//! # Re-entrancy
//!
//! A listener cannot reach the bus itself. It receives an [`EventSink`]
//! instead; events it emits there are delivered right after the current
//! event finishes dispatching, and events it defers wait for the next
//! [`EventBus::flush`]. Delivery order is only guaranteed among the
//! listeners of one event kind.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use swarmfall_core::entity::EntityId;
//! use swarmfall_core::event::{EventBus, EventKind, GameEvent};
//!
//! let mut bus = EventBus::new();
//! let kills = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&kills);
//! bus.subscribe(EventKind::EnemyKilled, move |_, _| counter.set(counter.get() + 1));
//!
//! bus.emit(GameEvent::EnemyKilled { enemy: EntityId::new(3), position: glam::Vec2::ZERO });
//! assert_eq!(kills.get(), 1);
//! assert_eq!(bus.events_of(EventKind::EnemyKilled).count(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::DropKind;
use crate::entity::EntityId;

/// Event name, one per [`GameEvent`] variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `collision`
    Collision,
    /// `enemy_killed`
    EnemyKilled,
    /// `player_died`
    PlayerDied,
    /// `item_picked_up`
    ItemPickedUp,
    /// `projectile_hit`
    ProjectileHit,
    /// `player_leveled_up`
    PlayerLeveledUp,
    /// `wave_changed`
    WaveChanged,
}

impl EventKind {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Collision => "collision",
            Self::EnemyKilled => "enemy_killed",
            Self::PlayerDied => "player_died",
            Self::ItemPickedUp => "item_picked_up",
            Self::ProjectileHit => "projectile_hit",
            Self::PlayerLeveledUp => "player_leveled_up",
            Self::WaveChanged => "wave_changed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something that happened this frame. Payloads are flat records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Two colliders overlap.
    Collision {
        /// Lower-id side of the pair.
        entity_a: EntityId,
        /// Higher-id side of the pair.
        entity_b: EntityId,
    },
    /// An enemy's health reached zero.
    EnemyKilled {
        /// The enemy.
        enemy: EntityId,
        /// Where it died.
        position: Vec2,
    },
    /// The player's health reached zero.
    PlayerDied {
        /// The player.
        player: EntityId,
    },
    /// The player collected a pickup.
    ItemPickedUp {
        /// The player.
        player: EntityId,
        /// The pickup.
        item: EntityId,
        /// Pickup kind.
        kind: DropKind,
        /// Amount granted.
        value: f32,
    },
    /// A projectile damaged an enemy.
    ProjectileHit {
        /// The projectile.
        projectile: EntityId,
        /// The enemy.
        enemy: EntityId,
        /// Damage applied.
        damage: f32,
        /// Whether the hit was critical.
        critical: bool,
    },
    /// The player gained a level.
    PlayerLeveledUp {
        /// The player.
        player: EntityId,
        /// New level.
        level: u32,
    },
    /// A new wave started.
    WaveChanged {
        /// New wave number.
        wave: u32,
    },
}

impl GameEvent {
    /// Kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Collision { .. } => EventKind::Collision,
            Self::EnemyKilled { .. } => EventKind::EnemyKilled,
            Self::PlayerDied { .. } => EventKind::PlayerDied,
            Self::ItemPickedUp { .. } => EventKind::ItemPickedUp,
            Self::ProjectileHit { .. } => EventKind::ProjectileHit,
            Self::PlayerLeveledUp { .. } => EventKind::PlayerLeveledUp,
            Self::WaveChanged { .. } => EventKind::WaveChanged,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Outbox handed to listeners during dispatch.
#[derive(Debug, Default)]
pub struct EventSink {
    immediate: Vec<GameEvent>,
    deferred: Vec<GameEvent>,
}

impl EventSink {
    /// Publishes `event` once the current dispatch finishes.
    pub fn emit(&mut self, event: GameEvent) {
        self.immediate.push(event);
    }

    /// Queues `event` for the next [`EventBus::flush`].
    pub fn defer(&mut self, event: GameEvent) {
        self.deferred.push(event);
    }
}

type Listener = Box<dyn FnMut(&GameEvent, &mut EventSink)>;

struct Subscription {
    id: ListenerId,
    kind: EventKind,
    listener: Listener,
}

/// Publish/subscribe channel with a deferred queue and a per-frame log.
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_listener: u64,
    pending: VecDeque<GameEvent>,
    deferred: Vec<GameEvent>,
    flushing: Vec<GameEvent>,
    frame_log: Vec<GameEvent>,
    sink: EventSink,
}

impl EventBus {
    /// An empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_listener: 0,
            pending: VecDeque::new(),
            deferred: Vec::new(),
            flushing: Vec::new(),
            frame_log: Vec::new(),
            sink: EventSink::default(),
        }
    }

    /// Registers `listener` for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&GameEvent, &mut EventSink) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.subscriptions.push(Subscription {
            id,
            kind,
            listener: Box::new(listener),
        });
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .iter()
            .filter(|subscription| subscription.kind == kind)
            .count()
    }

    /// Publishes `event` now.
    ///
    /// Listeners of the event's kind run in registration order. Events they
    /// emit through their sink are delivered after it, breadth first, before
    /// this call returns.
    pub fn emit(&mut self, event: GameEvent) {
        self.pending.push_back(event);
        while let Some(event) = self.pending.pop_front() {
            let kind = event.kind();
            let mut heard = false;
            for subscription in &mut self.subscriptions {
                if subscription.kind == kind {
                    (subscription.listener)(&event, &mut self.sink);
                    heard = true;
                }
            }
            if !heard {
                tracing::trace!(event = kind.name(), "no listeners");
            }
            self.frame_log.push(event);
            self.pending.extend(self.sink.immediate.drain(..));
            self.deferred.append(&mut self.sink.deferred);
        }
    }

    /// Queues `event` for the next [`EventBus::flush`].
    pub fn defer(&mut self, event: GameEvent) {
        self.deferred.push(event);
    }

    /// Number of events waiting for the next flush.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Publishes every deferred event. Events deferred while flushing wait
    /// for the following flush. Returns how many were published.
    pub fn flush(&mut self) -> usize {
        std::mem::swap(&mut self.deferred, &mut self.flushing);
        let mut batch = std::mem::take(&mut self.flushing);
        let count = batch.len();
        for event in batch.drain(..) {
            self.emit(event);
        }
        self.flushing = batch;
        count
    }

    /// Starts a new frame: clears the frame log.
    pub fn begin_frame(&mut self) {
        self.frame_log.clear();
    }

    /// Every event published since [`EventBus::begin_frame`], in order.
    #[must_use]
    pub fn frame_events(&self) -> &[GameEvent] {
        &self.frame_log
    }

    /// This frame's events of `kind`, in order.
    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &GameEvent> + '_ {
        self.frame_log
            .iter()
            .filter(move |event| event.kind() == kind)
    }

    /// Drops the frame log and the deferred queue. Listeners stay.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.deferred.clear();
        self.frame_log.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.subscriptions.len())
            .field("deferred", &self.deferred.len())
            .field("frame_log", &self.frame_log.len())
            .finish_non_exhaustive()
    }
}
