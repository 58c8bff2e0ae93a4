/*!
Process Manager - registry of running application instances.

A process is conventionally bound 1:1 to a window, but the registry does not
depend on the Window Manager. Terminated processes are removed, not kept for
inspection. Commands never fail; unknown ids are ignored.
*/

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Listeners, Subscription};
use crate::types::{Event, IdCounter, Process, ProcessId, ProcessStatus, ProcessUpdate, WindowId};

struct ProcessTable {
  processes: HashMap<ProcessId, Process>,
  ids: IdCounter,
}

impl ProcessTable {
  fn new() -> Self {
    Self {
      processes: HashMap::new(),
      ids: IdCounter::new(),
    }
  }

  /// Oldest live process bound to `window_id`. Ids are allocated in creation
  /// order, so the smallest id wins.
  fn by_window(&self, window_id: WindowId) -> Option<&Process> {
    self
      .processes
      .values()
      .filter(|p| p.window_id == Some(window_id))
      .min_by_key(|p| p.id)
  }

  fn set_status(&mut self, id: ProcessId, status: ProcessStatus) -> Vec<Event> {
    let Some(process) = self.processes.get_mut(&id) else {
      return Vec::new();
    };
    if process.status == status {
      return Vec::new();
    }
    log::debug!("process {id} {:?} -> {status:?}", process.status);
    process.status = status;
    vec![Event::ProcessChanged {
      process: process.clone(),
    }]
  }
}

/// Registry of logical running instances. Clone is cheap (Arc bumps).
#[derive(Clone)]
pub struct ProcessManager {
  table: Arc<Mutex<ProcessTable>>,
  listeners: Listeners,
}

impl std::fmt::Debug for ProcessManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ProcessManager")
      .field("processes", &self.read(|t| t.processes.len()))
      .finish_non_exhaustive()
  }
}

impl Default for ProcessManager {
  fn default() -> Self {
    Self::new()
  }
}

impl ProcessManager {
  pub fn new() -> Self {
    Self {
      table: Arc::new(Mutex::new(ProcessTable::new())),
      listeners: Listeners::new(),
    }
  }

  /// Register an observer, called once per event after each state change.
  pub fn subscribe(&self, callback: impl Fn(&Event) + Send + Sync + 'static) -> Subscription {
    self.listeners.subscribe(callback)
  }

  #[inline]
  fn read<R>(&self, f: impl FnOnce(&ProcessTable) -> R) -> R {
    f(&self.table.lock())
  }

  fn write<R>(&self, f: impl FnOnce(&mut ProcessTable) -> (R, Vec<Event>)) -> R {
    let result = {
      let mut table = self.table.lock();
      let (result, events) = f(&mut table);
      self.listeners.enqueue(events);
      result
    };
    self.listeners.flush();
    result
  }

  /// Start a process in the running state.
  ///
  /// Binding a window that already has a process is allowed (and logged);
  /// [`Self::get_process_by_window_id`] keeps returning the older one.
  pub fn create_process(&self, name: &str, app_id: &str, window_id: Option<WindowId>) -> ProcessId {
    self.write(|t| {
      if let Some(existing) = window_id.and_then(|w| t.by_window(w)) {
        log::warn!(
          "window {:?} is already bound to process {}; binding another",
          window_id,
          existing.id
        );
      }

      let id: ProcessId = t.ids.next();
      let process = Process {
        id,
        name: name.to_string(),
        app_id: app_id.to_string(),
        window_id,
        status: ProcessStatus::Running,
        created_at: Utc::now(),
      };
      log::debug!("process {id} started for {app_id}");
      t.processes.insert(id, process.clone());
      (id, vec![Event::ProcessAdded { process }])
    })
  }

  /// Mark terminated and remove from the registry in one step.
  pub fn terminate_process(&self, id: ProcessId) {
    self.write(|t| {
      let Some(mut process) = t.processes.remove(&id) else {
        return ((), Vec::new());
      };
      process.status = ProcessStatus::Terminated;
      log::debug!("process {id} ({}) {:?}", process.app_id, process.status);
      ((), vec![Event::ProcessRemoved { process_id: id }])
    });
  }

  /// Mark a process suspended. Unknown ids are ignored.
  pub fn suspend_process(&self, id: ProcessId) {
    self.write(|t| ((), t.set_status(id, ProcessStatus::Suspended)));
  }

  /// Mark a process running again.
  pub fn resume_process(&self, id: ProcessId) {
    self.write(|t| ((), t.set_status(id, ProcessStatus::Running)));
  }

  /// Merge a partial update into a process. Status is left alone.
  pub fn update_process(&self, id: ProcessId, update: ProcessUpdate) {
    self.write(|t| {
      let Some(process) = t.processes.get_mut(&id) else {
        return ((), Vec::new());
      };
      if let Some(name) = update.name {
        process.name = name;
      }
      if let Some(window_id) = update.window_id {
        process.window_id = Some(window_id);
      }
      let event = Event::ProcessChanged {
        process: process.clone(),
      };
      ((), vec![event])
    });
  }

  /// Current state of a process.
  pub fn get_process(&self, id: ProcessId) -> Option<Process> {
    self.read(|t| t.processes.get(&id).cloned())
  }

  /// First (oldest) process bound to the window, if any.
  pub fn get_process_by_window_id(&self, window_id: WindowId) -> Option<Process> {
    self.read(|t| t.by_window(window_id).cloned())
  }

  /// All live processes in creation order.
  pub fn get_all_processes(&self) -> Vec<Process> {
    self.read(|t| {
      let mut all: Vec<Process> = t.processes.values().cloned().collect();
      all.sort_by_key(|p| p.id);
      all
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn create_starts_running() {
    let pm = ProcessManager::new();
    let id = pm.create_process("Terminal", "terminal", Some(WindowId(1)));
    let p = pm.get_process(id).unwrap();
    assert_eq!(p.status, ProcessStatus::Running);
    assert_eq!(p.window_id, Some(WindowId(1)));
    assert_eq!(p.name, "Terminal");
  }

  #[test]
  fn terminate_removes_record() {
    let pm = ProcessManager::new();
    let id = pm.create_process("Terminal", "terminal", None);
    pm.terminate_process(id);
    assert!(pm.get_process(id).is_none());
    assert!(pm.get_all_processes().iter().all(|p| p.id != id));
  }

  #[test]
  fn suspend_resume_cycle() {
    let pm = ProcessManager::new();
    let id = pm.create_process("Writer", "writer", None);
    for _ in 0..3 {
      pm.suspend_process(id);
      assert_eq!(pm.get_process(id).unwrap().status, ProcessStatus::Suspended);
      pm.resume_process(id);
      assert_eq!(pm.get_process(id).unwrap().status, ProcessStatus::Running);
    }
  }

  #[test]
  fn lookup_by_window() {
    let pm = ProcessManager::new();
    pm.create_process("Headless", "daemon", None);
    let id = pm.create_process("Calc", "calc", Some(WindowId(3)));
    assert_eq!(pm.get_process_by_window_id(WindowId(3)).unwrap().id, id);
    assert!(pm.get_process_by_window_id(WindowId(4)).is_none());
  }

  #[test]
  fn shared_window_returns_oldest() {
    let pm = ProcessManager::new();
    let first = pm.create_process("A", "a", Some(WindowId(1)));
    let second = pm.create_process("B", "b", Some(WindowId(1)));
    assert_eq!(pm.get_process_by_window_id(WindowId(1)).unwrap().id, first);

    pm.terminate_process(first);
    assert_eq!(pm.get_process_by_window_id(WindowId(1)).unwrap().id, second);
  }

  #[test]
  fn update_merges_fields() {
    let pm = ProcessManager::new();
    let id = pm.create_process("Old", "app", Some(WindowId(1)));
    pm.update_process(
      id,
      ProcessUpdate {
        name: Some("New".into()),
        window_id: None,
      },
    );
    let p = pm.get_process(id).unwrap();
    assert_eq!(p.name, "New");
    assert_eq!(p.window_id, Some(WindowId(1)));
  }

  #[test]
  fn all_processes_in_creation_order() {
    let pm = ProcessManager::new();
    let ids: Vec<ProcessId> = (0..5)
      .map(|i| pm.create_process(&format!("p{i}"), "app", None))
      .collect();
    let listed: Vec<ProcessId> = pm.get_all_processes().iter().map(|p| p.id).collect();
    assert_eq!(listed, ids);
  }

  #[test]
  fn notifications_follow_mutations() {
    let pm = ProcessManager::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let e = Arc::clone(&events);
    let _sub = pm.subscribe(move |event| e.lock().push(event.clone()));

    let id = pm.create_process("A", "a", None);
    pm.suspend_process(id);
    pm.suspend_process(id); // no change, no event
    pm.terminate_process(id);
    pm.terminate_process(id); // unknown now

    let events = events.lock();
    assert_eq!(events.len(), 3);
    assert!(matches!(events.first(), Some(Event::ProcessAdded { .. })));
    assert_eq!(
      events.last(),
      Some(&Event::ProcessRemoved { process_id: id })
    );
  }

  #[test]
  fn unknown_ids_are_ignored() {
    let pm = ProcessManager::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let _sub = pm.subscribe(move |_| {
      c.fetch_add(1, Ordering::SeqCst);
    });
    let ghost = ProcessId(77);
    pm.suspend_process(ghost);
    pm.resume_process(ghost);
    pm.terminate_process(ghost);
    pm.update_process(ghost, ProcessUpdate::default());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }
}
