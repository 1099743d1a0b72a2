use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::Termination;

/// The D5700 register file.
#[derive(Debug)]
pub struct Registers {
  /// General-purpose registers r0..r7.
  r: [u8; 8],

  /// Program counter. Instructions are two bytes, so it stays even.
  pub p: u16,

  /// Address register for memory-indirect instructions.
  pub a: u16,

  /// Memory bank flag. Toggled by the bank-switch instruction; a second
  /// bus is not wired, so the flag is state only.
  pub m: bool,

  /// Timer register, shared with the timer clock's decrement worker.
  t: Arc<AtomicU8>,
}

impl Registers {
  pub fn new(t: Arc<AtomicU8>) -> Registers {
    Registers {
      r: [0; 8],
      p: 0,
      a: 0,
      m: false,
      t,
    }
  }

  pub fn r(&self, index: u8) -> Result<u8, Termination> {
    self
      .r
      .get(index as usize)
      .copied()
      .ok_or(Termination::BadRegister { index })
  }

  pub fn set_r(&mut self, index: u8, value: u8) -> Result<(), Termination> {
    match self.r.get_mut(index as usize) {
      Some(slot) => {
        *slot = value;
        Ok(())
      }
      None => Err(Termination::BadRegister { index }),
    }
  }

  pub fn t(&self) -> u8 {
    self.t.load(Ordering::SeqCst)
  }
}
