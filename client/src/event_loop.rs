//! Timer and task scheduling behind a trait so the sort orchestrator can be
//! driven by a virtual clock in tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

pub type TimerId = u64;

pub trait EventLoop {
    /// Run `callback` once after `delay_ms`.
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId;
    /// Cancel a timer. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);
}

/// Browser event loop: `setTimeout` through gloo futures and
/// `wasm_bindgen_futures::spawn_local`.
#[derive(Default)]
pub struct BrowserEventLoop {
    next_id: Cell<TimerId>,
    cancelled: Rc<RefCell<HashMap<TimerId, Rc<Cell<bool>>>>>,
}

impl BrowserEventLoop {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLoop for BrowserEventLoop {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let cancel_flag = Rc::new(Cell::new(false));
        self.cancelled
            .borrow_mut()
            .insert(id, Rc::clone(&cancel_flag));
        let registry = Rc::clone(&self.cancelled);

        wasm_bindgen_futures::spawn_local(async move {
            gloo_timers::future::TimeoutFuture::new(delay_ms).await;
            registry.borrow_mut().remove(&id);
            if !cancel_flag.get() {
                callback();
            }
        });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(flag) = self.cancelled.borrow_mut().remove(&id) {
            flag.set(true);
        }
    }

    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}

#[cfg(test)]
pub(crate) use virtual_loop::VirtualEventLoop;

#[cfg(test)]
mod virtual_loop {
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, HashMap};

    use futures::executor::{LocalPool, LocalSpawner};
    use futures::future::LocalBoxFuture;
    use futures::task::LocalSpawnExt;

    use super::{EventLoop, TimerId};

    /// Deterministic event loop with a manually advanced clock.
    pub(crate) struct VirtualEventLoop {
        now_ms: Cell<u64>,
        next_id: Cell<TimerId>,
        timers: RefCell<BTreeMap<(u64, TimerId), Box<dyn FnOnce()>>>,
        due_by_id: RefCell<HashMap<TimerId, u64>>,
        pool: RefCell<LocalPool>,
        spawner: LocalSpawner,
    }

    impl VirtualEventLoop {
        pub(crate) fn new() -> Self {
            let pool = LocalPool::new();
            let spawner = pool.spawner();
            Self {
                now_ms: Cell::new(0),
                next_id: Cell::new(0),
                timers: RefCell::new(BTreeMap::new()),
                due_by_id: RefCell::new(HashMap::new()),
                pool: RefCell::new(pool),
                spawner,
            }
        }

        pub(crate) fn now_ms(&self) -> u64 {
            self.now_ms.get()
        }

        pub(crate) fn pending_timers(&self) -> usize {
            self.timers.borrow().len()
        }

        /// Poll spawned tasks until none can make progress.
        pub(crate) fn run_until_stalled(&self) {
            self.pool.borrow_mut().run_until_stalled();
        }

        /// Move the clock forward, firing due timers in order and running
        /// spawned tasks between them.
        pub(crate) fn advance(&self, ms: u64) {
            let target = self.now_ms.get() + ms;
            loop {
                self.run_until_stalled();
                let next = {
                    let mut timers = self.timers.borrow_mut();
                    match timers.keys().next().copied() {
                        Some(key) if key.0 <= target => timers.remove(&key).map(|cb| (key, cb)),
                        _ => None,
                    }
                };
                let Some(((due, id), callback)) = next else {
                    break;
                };
                self.due_by_id.borrow_mut().remove(&id);
                self.now_ms.set(due);
                callback();
            }
            self.now_ms.set(target);
            self.run_until_stalled();
        }
    }

    impl EventLoop for VirtualEventLoop {
        fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            let due = self.now_ms.get() + u64::from(delay_ms);
            self.timers.borrow_mut().insert((due, id), callback);
            self.due_by_id.borrow_mut().insert(id, due);
            id
        }

        fn clear_timeout(&self, id: TimerId) {
            if let Some(due) = self.due_by_id.borrow_mut().remove(&id) {
                self.timers.borrow_mut().remove(&(due, id));
            }
        }

        fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
            if let Err(e) = self.spawner.spawn_local(future) {
                panic!("virtual event loop spawn failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{EventLoop, VirtualEventLoop};

    #[test]
    fn timers_fire_in_due_order() {
        let event_loop = VirtualEventLoop::new();
        let fired = Rc::new(RefCell::new(Vec::new()));
        for (delay, label) in [(300, "late"), (50, "early"), (150, "middle")] {
            let fired = Rc::clone(&fired);
            event_loop.set_timeout(delay, Box::new(move || fired.borrow_mut().push(label)));
        }

        event_loop.advance(149);
        assert_eq!(*fired.borrow(), vec!["early"]);
        event_loop.advance(1000);
        assert_eq!(*fired.borrow(), vec!["early", "middle", "late"]);
        assert_eq!(event_loop.now_ms(), 1149);
    }

    #[test]
    fn cleared_timer_never_fires() {
        let event_loop = VirtualEventLoop::new();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        let id = event_loop.set_timeout(10, Box::new(move || *flag.borrow_mut() = true));
        event_loop.clear_timeout(id);
        event_loop.advance(100);
        assert!(!*fired.borrow());
        assert_eq!(event_loop.pending_timers(), 0);
    }

    #[test]
    fn timers_scheduled_by_callbacks_use_the_callback_time() {
        let event_loop = Rc::new(VirtualEventLoop::new());
        let fired_at = Rc::new(RefCell::new(None));
        let inner_loop = Rc::clone(&event_loop);
        let inner_fired = Rc::clone(&fired_at);
        event_loop.set_timeout(
            100,
            Box::new(move || {
                let clock = Rc::clone(&inner_loop);
                let fired = Rc::clone(&inner_fired);
                inner_loop.set_timeout(
                    50,
                    Box::new(move || *fired.borrow_mut() = Some(clock.now_ms())),
                );
            }),
        );
        event_loop.advance(500);
        assert_eq!(*fired_at.borrow(), Some(150));
    }

    #[test]
    fn spawned_tasks_run_when_stalled() {
        let event_loop = VirtualEventLoop::new();
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        event_loop.spawn_local(Box::pin(async move {
            *flag.borrow_mut() = true;
        }));
        assert!(!*ran.borrow());
        event_loop.run_until_stalled();
        assert!(*ran.borrow());
    }
}
