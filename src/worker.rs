//! Background task engine.
//!
//! One thread runs every submitted function, one at a time, under three
//! policies:
//!
//! - [`Worker::queue`] runs each function exactly once, in order.
//! - [`Worker::debounce`] keeps only the latest function and runs it once
//!   the submissions have been quiet for the debounce period.
//! - [`Worker::debounce_load`] runs `refresh` of the latest submission,
//!   then keeps doing so while new submissions keep arriving. Once a whole
//!   refresh passes with nothing new, the latest `finish` runs, once.
//!   `on_load` fires only if a single refresh outlasts the load delay.
//!
//! A panic inside a submitted function is contained to that function.

use std::any::Any;
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::model::UiConfig;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Queue(Task),
    /// Stamped when submitted, so time spent behind other work counts
    /// toward the quiet period.
    Debounce(Task, Instant),
    Load(LoadTriple),
    Shutdown,
}

struct LoadTriple {
    refresh: Task,
    finish: Task,
    on_load: Task,
}

/// Progress of the active `debounce_load` submission
enum LoadState {
    /// Submitted, refresh not yet run
    Pending(LoadTriple),
    /// Refresh done; `finish` runs unless something newer arrives first
    Refreshed(Task),
}

/// Handle to the background engine. Dropping it runs whatever is still
/// queued with [`Worker::queue`], discards pending debounces, and joins the
/// thread.
pub struct Worker {
    tx: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// `debounce` is the quiet period for `debounce`; `load_delay` is how
    /// long a refresh may take before `on_load` fires.
    pub fn new(debounce: Duration, load_delay: Duration) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let engine = Engine {
            rx,
            debounce,
            load_delay,
            simple: VecDeque::new(),
            pending: None,
            load: None,
        };
        let handle = thread::Builder::new()
            .name("hangar-worker".into())
            .spawn(move || engine.run())?;
        Ok(Worker {
            tx,
            handle: Some(handle),
        })
    }

    pub fn from_config(ui: &UiConfig) -> io::Result<Self> {
        Self::new(
            Duration::from_millis(ui.debounce_ms),
            Duration::from_millis(ui.load_indicator_ms),
        )
    }

    pub fn queue(&self, f: impl FnOnce() + Send + 'static) {
        self.send(Message::Queue(Box::new(f)));
    }

    pub fn debounce(&self, f: impl FnOnce() + Send + 'static) {
        self.send(Message::Debounce(Box::new(f), Instant::now()));
    }

    pub fn debounce_load(
        &self,
        refresh: impl FnOnce() + Send + 'static,
        finish: impl FnOnce() + Send + 'static,
        on_load: impl FnOnce() + Send + 'static,
    ) {
        self.send(Message::Load(LoadTriple {
            refresh: Box::new(refresh),
            finish: Box::new(finish),
            on_load: Box::new(on_load),
        }));
    }

    /// Stop the engine and wait for it.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn send(&self, message: Message) {
        if self.tx.send(message).is_err() {
            tracing::warn!("worker thread is gone, dropping submission");
        }
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("worker thread panicked");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Engine {
    rx: Receiver<Message>,
    debounce: Duration,
    load_delay: Duration,
    simple: VecDeque<Task>,
    pending: Option<(Task, Instant)>,
    load: Option<LoadState>,
}

impl Engine {
    fn run(mut self) {
        loop {
            let first = if self.busy() {
                None
            } else {
                match self.pending.as_ref().map(|(_, at)| *at) {
                    None => match self.rx.recv() {
                        Ok(m) => Some(m),
                        Err(_) => break,
                    },
                    Some(at) => {
                        match self.rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                            Ok(m) => Some(m),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                }
            };
            if let Some(message) = first
                && !self.accept(message)
            {
                break;
            }
            if !self.drain() {
                break;
            }
            self.step();
        }

        // Queued work must not be lost; debounced work is disposable.
        while let Some(task) = self.simple.pop_front() {
            run_contained("queue", task);
        }
    }

    fn busy(&self) -> bool {
        !self.simple.is_empty() || self.load.is_some()
    }

    /// Returns false once the engine should stop.
    fn accept(&mut self, message: Message) -> bool {
        match message {
            Message::Queue(task) => self.simple.push_back(task),
            Message::Debounce(task, submitted) => {
                // A quiet period that ended before this submission has earned its run.
                if let Some((due, at)) = self.pending.take()
                    && at <= submitted
                {
                    self.simple.push_back(due);
                }
                self.pending = Some((task, submitted + self.debounce));
            }
            Message::Load(triple) => self.load = Some(LoadState::Pending(triple)),
            Message::Shutdown => return false,
        }
        true
    }

    fn drain(&mut self) -> bool {
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if !self.accept(message) {
                        return false;
                    }
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn step(&mut self) {
        while let Some(task) = self.simple.pop_front() {
            run_contained("queue", task);
        }

        if self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| *at <= Instant::now())
            && let Some((task, _)) = self.pending.take()
        {
            run_contained("debounce", task);
        }

        match self.load.take() {
            Some(LoadState::Pending(triple)) => {
                let timer = OneShot::arm(self.load_delay, triple.on_load);
                run_contained("refresh", triple.refresh);
                timer.cancel();
                self.load = Some(LoadState::Refreshed(triple.finish));
            }
            Some(LoadState::Refreshed(finish)) => run_contained("finish", finish),
            None => {}
        }
    }
}

/// A cancellable one-shot timer on its own thread.
struct OneShot {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl OneShot {
    fn arm(delay: Duration, f: Task) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        let spawned = thread::Builder::new()
            .name("hangar-load-timer".into())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(delay) {
                    run_contained("on_load", f);
                }
            });
        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "could not start load timer");
                None
            }
        };
        OneShot {
            cancel: Some(tx),
            handle,
        }
    }

    /// Stop the timer. Returns only once it can no longer fire.
    fn cancel(mut self) {
        drop(self.cancel.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_contained(kind: &'static str, task: Task) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        tracing::error!(kind, message = %panic_message(&*payload), "submitted task panicked");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn worker() -> Worker {
        Worker::new(Duration::from_millis(30), Duration::from_millis(40)).unwrap()
    }

    #[test]
    fn queue_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let w = worker();
        for i in 0..5 {
            let log = Arc::clone(&log);
            w.queue(move || log.lock().unwrap().push(i));
        }
        w.shutdown();
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn panic_does_not_stop_engine() {
        let (tx, rx) = mpsc::channel();
        let w = worker();
        w.queue(|| panic!("boom"));
        w.queue(move || tx.send(()).unwrap());
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
    }

    #[test]
    fn panic_message_variants() {
        let p: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*p), "static");
        let p: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*p), "owned");
        let p: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*p), "unknown panic");
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let (tx, rx) = mpsc::channel();
        let timer = OneShot::arm(Duration::from_millis(50), Box::new(move || tx.send(()).unwrap()));
        timer.cancel();
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }

    #[test]
    fn timer_fires_after_delay() {
        let (tx, rx) = mpsc::channel();
        let _timer = OneShot::arm(Duration::from_millis(10), Box::new(move || tx.send(()).unwrap()));
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
    }
}
