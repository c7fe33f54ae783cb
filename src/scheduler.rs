use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use calloop::{Idle, LoopHandle};

/// Deferred units of dialog work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    RebuildIndex,
    FindCommand,
}

/// Runs tasks when the event loop goes idle. A task runs to completion
/// once started; until then it can be cancelled.
pub struct Scheduler<D: 'static> {
    handle: LoopHandle<'static, D>,
    pending: Rc<RefCell<HashMap<Task, Idle<'static>>>>,
}

impl<D: 'static> Scheduler<D> {
    pub fn new(handle: LoopHandle<'static, D>) -> Self {
        Self {
            handle,
            pending: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Queues `work` unless `task` is already waiting to run.
    pub fn schedule<F>(&self, task: Task, work: F) -> bool
    where
        F: FnOnce(&mut D) + 'static,
    {
        if self.is_pending(task) {
            return false;
        }
        let pending = Rc::clone(&self.pending);
        let idle = self.handle.insert_idle(move |data: &mut D| {
            pending.borrow_mut().remove(&task);
            work(data);
        });
        self.pending.borrow_mut().insert(task, idle);
        true
    }

    pub fn is_pending(&self, task: Task) -> bool {
        self.pending.borrow().contains_key(&task)
    }

    pub fn cancel(&self, task: Task) {
        if let Some(idle) = self.pending.borrow_mut().remove(&task) {
            log::debug!("Cancelled pending {:?}", task);
            idle.cancel();
        }
    }

    pub fn cancel_all(&self) {
        for (_, idle) in self.pending.borrow_mut().drain() {
            idle.cancel();
        }
    }
}
