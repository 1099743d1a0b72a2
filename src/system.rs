use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::cpu::{Cpu, IoMap};
use crate::input::InputSource;
use crate::mem::{AddressSpace, AsciiDisplay, Keyboard, Ram, Rom};
use crate::timer::TimerClock;

pub const CPU_HZ: u32 = 500;
const CPU_PERIOD: Duration = Duration::from_millis(2);

pub const ROM_SIZE: u16 = 4096;
pub const RAM_SIZE: u16 = 4096;

/// Where each device sits on the bus. The keyboard and display bases vary
/// between deployments, so they are plain configuration rather than
/// constants.
#[derive(Debug, Clone, Copy)]
pub struct MemoryLayout {
  pub rom_base: u16,
  pub ram_base: u16,
  pub keyboard_base: u16,
  pub display_base: u16,
}

impl Default for MemoryLayout {
  /// ROM, RAM, keyboard and display packed back to back from 0x0000.
  fn default() -> MemoryLayout {
    let rom_base = 0x0000;
    let ram_base = rom_base + ROM_SIZE;
    let keyboard_base = ram_base + RAM_SIZE;
    MemoryLayout {
      rom_base,
      ram_base,
      keyboard_base,
      display_base: keyboard_base + 1,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  Stopped,
  Running,
  Paused,
  ShutDown,
}

/// Everything the CPU thread owns while running.
struct Machine {
  cpu: Cpu,
  mem: AddressSpace,
}

/// Owns the whole machine and runs its two clocks: the CPU schedule at
/// 500 Hz on a dedicated thread and the timer clock's own 60 Hz worker.
/// Pausing stops CPU cycles only; the timer keeps decrementing.
pub struct System {
  layout: MemoryLayout,
  timer: TimerClock,
  state: Arc<Mutex<LifecycleState>>,
  machine: Option<Arc<Mutex<Machine>>>,
  cpu_thread: Option<thread::JoinHandle<()>>,
}

impl System {
  pub fn new(layout: MemoryLayout) -> System {
    System {
      layout,
      timer: TimerClock::new(),
      state: Arc::new(Mutex::new(LifecycleState::Stopped)),
      machine: None,
      cpu_thread: None,
    }
  }

  /// Wire the devices and construct the CPU. The ROM image is padded with
  /// zeros or truncated to the fixed ROM size.
  pub fn initialize(&mut self, image: &[u8], input: Box<dyn InputSource>) {
    let rom_size = ROM_SIZE as usize;
    if image.len() > rom_size {
      warn!(
        "ROM image is {} bytes, truncating to {}",
        image.len(),
        rom_size
      );
    } else if image.len() < rom_size {
      warn!(
        "ROM image is {} bytes, padding with zeros to {}",
        image.len(),
        rom_size
      );
    }

    let layout = self.layout;
    let mut mem = AddressSpace::new();
    mem.add_device(Box::new(Rom::new(layout.rom_base, ROM_SIZE, image)));
    mem.add_device(Box::new(Ram::new(layout.ram_base, RAM_SIZE)));
    mem.add_device(Box::new(Keyboard::new(layout.keyboard_base, input)));
    mem.add_device(Box::new(AsciiDisplay::new(layout.display_base)));
    info!(
      "memory map: rom 0x{:04X}+{}, ram 0x{:04X}+{}, keyboard 0x{:04X}, display 0x{:04X}",
      layout.rom_base, ROM_SIZE, layout.ram_base, RAM_SIZE, layout.keyboard_base,
      layout.display_base
    );

    let cpu = Cpu::new(
      self.timer.clone(),
      IoMap {
        keyboard: layout.keyboard_base,
        display: layout.display_base,
      },
    );
    self.machine = Some(Arc::new(Mutex::new(Machine { cpu, mem })));
  }

  /// Begin executing cycles. Cycles are paced at 500 Hz; a pending
  /// keyboard read delays the schedule but never drops a cycle.
  pub fn start(&mut self) {
    let machine = match &self.machine {
      Some(machine) => Arc::clone(machine),
      None => {
        warn!("cannot start before initialization");
        return;
      }
    };
    {
      let mut state = self.lock_state();
      match *state {
        LifecycleState::Stopped => *state = LifecycleState::Running,
        other => {
          warn!("cannot start while {:?}", other);
          return;
        }
      }
    }

    info!("starting emulation at {} Hz", CPU_HZ);
    let state = Arc::clone(&self.state);
    let timer = self.timer.clone();
    let handle = thread::spawn(move || {
      let sleeper = spin_sleep::SpinSleeper::default();
      loop {
        match *state.lock().expect("lifecycle state lock poisoned") {
          LifecycleState::ShutDown => break,
          LifecycleState::Paused => {
            sleeper.sleep(CPU_PERIOD);
            continue;
          }
          LifecycleState::Running | LifecycleState::Stopped => {}
        }

        let mut guard = machine.lock().expect("machine lock poisoned");
        let Machine { cpu, mem } = &mut *guard;
        let result = cpu.step(mem);
        drop(guard);

        if let Err(fault) = result {
          error!("program terminated: {}", fault);
          *state.lock().expect("lifecycle state lock poisoned") = LifecycleState::ShutDown;
          timer.shutdown();
          break;
        }
        sleeper.sleep(CPU_PERIOD);
      }
    });
    self.cpu_thread = Some(handle);
  }

  /// Stop scheduling CPU cycles. A cycle already in progress completes;
  /// the timer clock keeps running.
  pub fn pause(&self) {
    let mut state = self.lock_state();
    match *state {
      LifecycleState::Running => {
        *state = LifecycleState::Paused;
        info!("emulation paused");
      }
      other => warn!("cannot pause while {:?}", other),
    }
  }

  /// Resume CPU cycles where they left off.
  pub fn resume(&self) {
    let mut state = self.lock_state();
    match *state {
      LifecycleState::Paused => {
        *state = LifecycleState::Running;
        info!("emulation resumed");
      }
      other => warn!("cannot resume while {:?}", other),
    }
  }

  /// Stop both clocks. Idempotent; never interrupts a cycle in progress.
  pub fn shutdown(&mut self) {
    {
      let mut state = self.lock_state();
      if *state == LifecycleState::ShutDown {
        return;
      }
      *state = LifecycleState::ShutDown;
    }
    info!("shutting down");
    self.timer.shutdown();
    if let Some(handle) = self.cpu_thread.take() {
      let _ = handle.join();
    }
  }

  /// Block until the CPU thread exits (fatal program condition or an
  /// external shutdown).
  pub fn wait(&mut self) {
    if let Some(handle) = self.cpu_thread.take() {
      let _ = handle.join();
    }
  }

  pub fn state(&self) -> LifecycleState {
    *self.lock_state()
  }

  /// Rendered view of the display. Blocks while a keyboard read is
  /// holding the machine.
  pub fn rendered_display(&self) -> Option<String> {
    let machine = self.machine.as_ref()?;
    let machine = machine.lock().expect("machine lock poisoned");
    machine.mem.render_display()
  }

  fn lock_state(&self) -> std::sync::MutexGuard<'_, LifecycleState> {
    self.state.lock().expect("lifecycle state lock poisoned")
  }

  #[cfg(test)]
  fn timer_value(&self) -> u8 {
    self.timer.value()
  }
}

impl Drop for System {
  fn drop(&mut self) {
    self.shutdown();
  }
}
