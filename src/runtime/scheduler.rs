use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// FIFO queue of deferred work for one suite.
///
/// Tests that finish asynchronously push tasks here through
/// [`Context::defer`](crate::runtime::Context::defer); the suite runner drains
/// the queue once every test function has returned. Tasks may enqueue more
/// tasks while the queue drains.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    fn pop(&self) -> Option<Task> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Runs queued tasks until none are left. Returns how many ran.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop() {
            task();
            ran += 1;
        }
        ran
    }
}
