use std::cell::RefCell;
use std::rc::Rc;

use crate::event_loop::{EventLoop, TimerId};

struct Pending {
    timer: TimerId,
    action: Box<dyn FnOnce()>,
}

/// Trailing-edge debouncer: each `schedule` replaces the pending action and
/// restarts the quiet period.
pub struct Debouncer {
    event_loop: Rc<dyn EventLoop>,
    delay_ms: u32,
    pending: Rc<RefCell<Option<Pending>>>,
}

impl Debouncer {
    pub fn new(event_loop: Rc<dyn EventLoop>, delay_ms: u32) -> Self {
        Self {
            event_loop,
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn schedule(&self, action: impl FnOnce() + 'static) {
        self.cancel();
        let slot = Rc::clone(&self.pending);
        let timer = self.event_loop.set_timeout(
            self.delay_ms,
            Box::new(move || {
                let due = slot.borrow_mut().take();
                if let Some(pending) = due {
                    (pending.action)();
                }
            }),
        );
        *self.pending.borrow_mut() = Some(Pending {
            timer,
            action: Box::new(action),
        });
    }

    /// Drop the pending action. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(pending) => {
                self.event_loop.clear_timeout(pending.timer);
                true
            }
            None => false,
        }
    }

    /// Run the pending action immediately instead of waiting.
    pub fn fire_now(&self) -> bool {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(pending) => {
                self.event_loop.clear_timeout(pending.timer);
                (pending.action)();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}
