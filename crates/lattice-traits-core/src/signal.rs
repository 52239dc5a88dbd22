//! Observer lists for change notifications.
//!
//! Every notification in Lattice Traits goes through a [`Signal`] owned by the
//! object that fires it: a model announcing a new value, a target reporting
//! a mutation, an element reporting a native change. There is no global bus;
//! listeners hold a [`ConnectionId`] and hand it back to disconnect.
//!
//! # Re-entrancy
//!
//! `emit` copies the connected slots out of the lock before calling them.
//! A slot may connect, disconnect or emit again on the same signal. A slot
//! removed during an emission still sees that emission but no later one.
//!
//! # Example
//!
//! ```
//! use lattice_traits_core::Signal;
//!
//! let value_changed = Signal::<String>::new();
//!
//! let id = value_changed.connect(|value| {
//!     println!("width is now {value}");
//! });
//!
//! value_changed.emit("120px".to_string());
//! assert!(value_changed.disconnect(id));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle of one connected slot, returned by [`Signal::connect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A slot and its connection sequence number.
///
/// Slotmap keys are reused after a disconnect, so key order is not
/// connection order; the sequence number is.
struct Entry<Args> {
    seq: u64,
    slot: Slot<Args>,
}

/// Observer list invoked synchronously on the emitting thread.
///
/// `Args` is the payload handed to every slot by reference; use `()` for
/// bare notifications.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Entry<Args>>>,
    next_seq: AtomicU64,
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
            next_seq: AtomicU64::new(0),
            blocked: AtomicBool::new(false),
        }
    }

    /// Add a slot. It stays connected until [`disconnect`](Self::disconnect).
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = self.slots.lock().insert(Entry {
            seq,
            slot: Arc::new(slot),
        });
        tracing::trace!(target: "lattice_traits_core::signal", ?id, "slot connected");
        id
    }

    /// Remove a slot. Returns `false` if `id` was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.slots.lock().remove(id).is_some();
        if removed {
            tracing::trace!(target: "lattice_traits_core::signal", ?id, "slot disconnected");
        }
        removed
    }

    pub fn disconnect_all(&self) {
        self.slots.lock().clear();
    }

    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.slots.lock().contains_key(id)
    }

    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Suppress emissions until unblocked.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Call every connected slot with `args`, oldest connection first.
    ///
    /// All slots have returned by the time `emit` does.
    #[tracing::instrument(skip_all, target = "lattice_traits_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "lattice_traits_core::signal", "blocked, emission dropped");
            return;
        }

        let mut ordered: Vec<(u64, Slot<Args>)> = self
            .slots
            .lock()
            .values()
            .map(|entry| (entry.seq, entry.slot.clone()))
            .collect();
        ordered.sort_unstable_by_key(|(seq, _)| *seq);
        let snapshot: Vec<Slot<Args>> = ordered.into_iter().map(|(_, slot)| slot).collect();
        tracing::trace!(target: "lattice_traits_core::signal", slots = snapshot.len(), "emitting");

        for slot in snapshot {
            slot(&args);
        }
    }

    /// Connect a slot for as long as the returned guard lives.
    pub fn connect_scoped<F>(signal: &Arc<Self>, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        ConnectionGuard {
            id: signal.connect(slot),
            signal: Arc::clone(signal),
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.lock().len())
            .field("blocked", &self.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

/// Disconnects its slot on drop.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use lattice_traits_core::Signal;
///
/// let removed = Arc::new(Signal::<()>::new());
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let seen_clone = seen.clone();
/// let guard = Signal::connect_scoped(&removed, move |_| {
///     seen_clone.fetch_add(1, Ordering::SeqCst);
/// });
/// removed.emit(());
/// drop(guard);
/// removed.emit(());
///
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct ConnectionGuard<Args: 'static> {
    signal: Arc<Signal<Args>>,
    id: ConnectionId,
}

impl<Args: 'static> ConnectionGuard<Args> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        self.signal.disconnect(self.id);
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn recorder<T: Clone + Send + 'static>(
        signal: &Signal<T>,
    ) -> (ConnectionId, Arc<Mutex<Vec<T>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let id = signal.connect(move |value: &T| sink.lock().push(value.clone()));
        (id, log)
    }

    #[test]
    fn test_slots_receive_in_order() {
        let widths = Signal::<&'static str>::new();
        let (_, log) = recorder(&widths);

        widths.emit("10px");
        widths.emit("20px");

        assert_eq!(*log.lock(), vec!["10px", "20px"]);
    }

    #[test]
    fn test_order_survives_key_reuse() {
        let signal = Signal::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let named = |name: &'static str| {
            let order = order.clone();
            move |_: &()| order.lock().push(name)
        };

        let first = signal.connect(named("first"));
        signal.connect(named("second"));
        signal.disconnect(first);
        // Takes over the freed slot of `first`
        signal.connect(named("third"));

        signal.emit(());
        assert_eq!(*order.lock(), vec!["second", "third"]);
    }

    #[test]
    fn test_disconnected_slot_stays_quiet() {
        let titles = Signal::<String>::new();
        let (id, log) = recorder(&titles);

        titles.emit("Home".into());
        assert!(titles.disconnect(id));
        assert!(!titles.is_connected(id));
        titles.emit("About".into());

        assert!(!titles.disconnect(id));
        assert_eq!(*log.lock(), vec!["Home".to_string()]);
    }

    #[test]
    fn test_blocked_emissions_are_dropped() {
        let signal = Signal::<u8>::new();
        let (_, log) = recorder(&signal);

        signal.set_blocked(true);
        assert!(signal.is_blocked());
        signal.emit(1);
        signal.set_blocked(false);
        signal.emit(2);

        assert_eq!(*log.lock(), vec![2]);
    }

    #[test]
    fn test_disconnect_all_clears_every_slot() {
        let removed = Signal::<()>::new();
        removed.connect(|_| {});
        removed.connect(|_| {});
        removed.connect(|_| {});

        assert_eq!(removed.connection_count(), 3);
        removed.disconnect_all();
        assert_eq!(removed.connection_count(), 0);
    }

    #[test]
    fn test_guard_disconnects_on_drop() {
        let signal = Arc::new(Signal::<u8>::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        let guard = Signal::connect_scoped(&signal, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(signal.is_connected(guard.id()));
        signal.emit(0);
        drop(guard);
        signal.emit(0);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_slot_can_reenter_signal() {
        let signal = Arc::new(Signal::<u32>::new());
        let depths = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&signal);
        let depths_clone = depths.clone();
        signal.connect(move |&depth| {
            depths_clone.lock().push(depth);
            if depth < 3 {
                if let Some(signal) = weak.upgrade() {
                    signal.emit(depth + 1);
                }
            }
        });

        signal.emit(0);
        assert_eq!(*depths.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_slot_can_disconnect_itself() {
        let signal = Arc::new(Signal::<()>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None::<ConnectionId>));

        let weak = Arc::downgrade(&signal);
        let calls_clone = calls.clone();
        let own_id_clone = own_id.clone();
        let id = signal.connect(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if let (Some(signal), Some(id)) = (weak.upgrade(), *own_id_clone.lock()) {
                signal.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.emit(());
        signal.emit(());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_slot_connected_during_emit_waits_for_next() {
        let signal = Arc::new(Signal::<()>::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&signal);
        let late_calls_clone = late_calls.clone();
        signal.connect(move |_| {
            if let Some(signal) = weak.upgrade() {
                let counter = late_calls_clone.clone();
                signal.connect(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        signal.emit(());
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        signal.emit(());
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }
}
