use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::info;

pub const TIMER_HZ: u32 = 60;

/// ~16.67ms per decrement.
const TICK_PERIOD: Duration = Duration::from_micros(1_000_000 / TIMER_HZ as u64);

/// The timer register and its decrement worker.
///
/// The register itself is an atomic byte shared with the CPU's register
/// file; the worker decrements it at 60 Hz on its own thread, independent
/// of the CPU clock and of pause state. Handles are cheap clones over the
/// same state.
#[derive(Clone)]
pub struct TimerClock {
  value: Arc<AtomicU8>,
  /// Bumped to cancel the current worker; a worker exits once its
  /// generation is stale.
  generation: Arc<AtomicU64>,
  worker: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
}

impl TimerClock {
  pub fn new() -> TimerClock {
    TimerClock {
      value: Arc::new(AtomicU8::new(0)),
      generation: Arc::new(AtomicU64::new(0)),
      worker: Arc::new(Mutex::new(None)),
    }
  }

  /// The shared timer register, for wiring into a register file.
  pub fn value_handle(&self) -> Arc<AtomicU8> {
    Arc::clone(&self.value)
  }

  pub fn value(&self) -> u8 {
    self.value.load(Ordering::SeqCst)
  }

  /// Set the timer register. A non-zero value (re)starts the decrement
  /// worker; zero stops it.
  pub fn set_timer_value(&self, value: u8) {
    self.value.store(value, Ordering::SeqCst);
    if value > 0 {
      self.start_decrementing();
    } else {
      self.stop_decrementing();
    }
  }

  fn start_decrementing(&self) {
    let generation = Arc::clone(&self.generation);
    let current = generation.fetch_add(1, Ordering::SeqCst) + 1;
    let value = Arc::clone(&self.value);
    let handle = thread::spawn(move || {
      let sleeper = spin_sleep::SpinSleeper::default();
      loop {
        sleeper.sleep(TICK_PERIOD);
        if generation.load(Ordering::SeqCst) != current {
          break;
        }
        if !tick(&value) {
          break;
        }
      }
    });
    // A superseded worker exits on its next tick; dropping its handle
    // detaches it.
    let mut worker = self.worker.lock().expect("timer worker lock poisoned");
    *worker = Some(handle);
  }

  fn stop_decrementing(&self) {
    self.generation.fetch_add(1, Ordering::SeqCst);
  }

  /// Stop the worker and wait for it to exit.
  pub fn shutdown(&self) {
    self.stop_decrementing();
    let handle = self.worker.lock().expect("timer worker lock poisoned").take();
    if let Some(handle) = handle {
      let _ = handle.join();
    }
    info!("timer clock stopped");
  }
}

/// One 60 Hz tick: decrement the register if non-zero, as a single
/// read-modify-write. Returns false once the worker should cancel itself.
fn tick(value: &AtomicU8) -> bool {
  match value.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| t.checked_sub(1)) {
    Ok(previous) => previous > 1,
    Err(_) => false,
  }
}
