/*!
Listener sets for synchronous change notification.

Each manager owns one `Listeners`. Delivery is two-step:
- `enqueue` runs while the manager lock is held, so the queue order is the
  mutation order
- `flush` runs after the lock is released and calls back every listener

Only one thread delivers at a time. A `flush` that finds another delivery in
progress returns at once and its events are delivered by that thread, in
order. A callback may therefore read from (or write to) the manager that
notified it; events produced by such a nested write are delivered after the
current one.
*/

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use crate::types::Event;

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

struct Inner {
  next_key: u64,
  callbacks: Vec<(u64, Callback)>,
}

#[derive(Default)]
struct Queue {
  pending: VecDeque<Event>,
  delivering: bool,
}

/// Registered observers for one manager.
#[derive(Clone)]
pub(crate) struct Listeners {
  inner: Arc<Mutex<Inner>>,
  queue: Arc<Mutex<Queue>>,
}

impl std::fmt::Debug for Listeners {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Listeners")
      .field("count", &self.len())
      .finish()
  }
}

/// Releases delivery when a callback panics. On the normal path the flag is
/// cleared by `flush` itself, under the queue lock.
struct Delivering<'a>(&'a Mutex<Queue>);

impl Drop for Delivering<'_> {
  fn drop(&mut self) {
    if std::thread::panicking() {
      self.0.lock().delivering = false;
    }
  }
}

impl Listeners {
  pub(crate) fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(Inner {
        next_key: 0,
        callbacks: Vec::new(),
      })),
      queue: Arc::new(Mutex::new(Queue::default())),
    }
  }

  /// Register a callback. It stays registered until the returned handle is
  /// dropped or [`Subscription::unsubscribe`] is called.
  pub(crate) fn subscribe(&self, callback: impl Fn(&Event) + Send + Sync + 'static) -> Subscription {
    let mut inner = self.inner.lock();
    let key = inner.next_key;
    inner.next_key += 1;
    inner.callbacks.push((key, Arc::new(callback)));
    Subscription {
      key,
      listeners: Arc::downgrade(&self.inner),
    }
  }

  /// Queue events for delivery. Call with the manager lock held.
  pub(crate) fn enqueue(&self, events: Vec<Event>) {
    if !events.is_empty() {
      self.queue.lock().pending.extend(events);
    }
  }

  /// Deliver queued events to every callback, in queue order. Call with the
  /// manager lock released.
  pub(crate) fn flush(&self) {
    {
      let mut queue = self.queue.lock();
      if queue.delivering || queue.pending.is_empty() {
        return;
      }
      queue.delivering = true;
    }
    let _guard = Delivering(&self.queue);

    loop {
      let event = {
        let mut queue = self.queue.lock();
        let Some(event) = queue.pending.pop_front() else {
          // Cleared under the same lock that `enqueue` takes, so nothing
          // queued after this point is left without a deliverer.
          queue.delivering = false;
          return;
        };
        event
      };
      // Copied so a callback can subscribe or unsubscribe without deadlocking.
      let callbacks: Vec<Callback> = self
        .inner
        .lock()
        .callbacks
        .iter()
        .map(|(_, cb)| Arc::clone(cb))
        .collect();
      for callback in &callbacks {
        callback(&event);
      }
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.inner.lock().callbacks.len()
  }
}

/// Handle to a registered listener. Unsubscribes on drop.
#[must_use = "the listener is removed as soon as the Subscription is dropped"]
pub struct Subscription {
  key: u64,
  listeners: Weak<Mutex<Inner>>,
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("key", &self.key)
      .finish_non_exhaustive()
  }
}

impl Subscription {
  /// Stop receiving notifications.
  pub fn unsubscribe(self) {
    // Drop will handle cleanup
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(inner) = self.listeners.upgrade() {
      inner.lock().callbacks.retain(|(key, _)| *key != self.key);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::WindowId;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn notify(listeners: &Listeners, events: &[Event]) {
    listeners.enqueue(events.to_vec());
    listeners.flush();
  }

  fn removed(id: u32) -> Event {
    Event::WindowRemoved {
      window_id: WindowId(id),
    }
  }

  #[test]
  fn notify_reaches_every_listener() {
    let listeners = Listeners::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c1 = Arc::clone(&count);
    let c2 = Arc::clone(&count);
    let _a = listeners.subscribe(move |_| {
      c1.fetch_add(1, Ordering::SeqCst);
    });
    let _b = listeners.subscribe(move |_| {
      c2.fetch_add(1, Ordering::SeqCst);
    });

    notify(&listeners, &[removed(1), removed(2)]);
    assert_eq!(count.load(Ordering::SeqCst), 4);
  }

  #[test]
  fn unsubscribe_stops_delivery() {
    let listeners = Listeners::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let sub = listeners.subscribe(move |_| {
      c.fetch_add(1, Ordering::SeqCst);
    });

    notify(&listeners, &[removed(1)]);
    sub.unsubscribe();
    notify(&listeners, &[removed(2)]);

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(listeners.len(), 0);
  }

  #[test]
  fn events_delivered_in_order() {
    let listeners = Listeners::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    let _sub = listeners.subscribe(move |e| s.lock().push(e.clone()));

    notify(&listeners, &[removed(1), removed(2), removed(3)]);
    assert_eq!(*seen.lock(), vec![removed(1), removed(2), removed(3)]);
  }

  #[test]
  fn callback_may_unsubscribe_others() {
    let listeners = Listeners::new();
    let other = Arc::new(Mutex::new(None::<Subscription>));
    let slot = Arc::clone(&other);
    let _first = listeners.subscribe(move |_| {
      slot.lock().take();
    });
    *other.lock() = Some(listeners.subscribe(|_| {}));

    notify(&listeners, &[removed(1)]);
    assert_eq!(listeners.len(), 1);
  }

  #[test]
  fn nested_events_follow_the_current_one() {
    let listeners = Listeners::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    let nested = listeners.clone();
    let _sub = listeners.subscribe(move |e| {
      s.lock().push(e.clone());
      if *e == removed(1) {
        notify(&nested, &[removed(3)]);
      }
    });

    notify(&listeners, &[removed(1), removed(2)]);
    assert_eq!(*seen.lock(), vec![removed(1), removed(2), removed(3)]);
  }

  #[test]
  fn panicking_callback_does_not_stall_delivery() {
    let listeners = Listeners::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let _sub = listeners.subscribe(move |e| {
      c.fetch_add(1, Ordering::SeqCst);
      assert_ne!(*e, removed(1));
    });

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
      notify(&listeners, &[removed(1)]);
    }));
    assert!(result.is_err());
    notify(&listeners, &[removed(2)]);
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn subscription_outliving_listeners_is_harmless() {
    let listeners = Listeners::new();
    let sub = listeners.subscribe(|_| {});
    drop(listeners);
    drop(sub);
  }
}
