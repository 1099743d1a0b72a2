pub mod display;
mod keyboard;
mod ram;
mod rom;

pub use self::display::AsciiDisplay;
pub use self::keyboard::Keyboard;
pub use self::ram::Ram;
pub use self::rom::Rom;

use log::warn;

use crate::error::Termination;

/// A device mapped into a contiguous slice of the 16-bit address space.
///
/// Devices receive *global* bus addresses and translate them to local
/// offsets themselves. Ranges registered in one `AddressSpace` must not
/// overlap; that is the wiring code's responsibility and is not checked
/// at runtime.
pub trait MemoryDevice: Send {
  fn base(&self) -> u16;
  fn size(&self) -> u16;

  /// Read the byte at `addr`. Callers must check `contains` first.
  fn read(&mut self, addr: u16) -> u8;

  /// Write `value` at `addr`. Read-only devices reject the write without
  /// mutating anything.
  fn write(&mut self, addr: u16, value: u8) -> Result<(), Termination>;

  fn contains(&self, addr: u16) -> bool {
    addr >= self.base() && addr - self.base() < self.size()
  }

  fn offset(&self, addr: u16) -> usize {
    (addr - self.base()) as usize
  }

  /// Rendered view for devices that have one.
  fn render(&self) -> Option<String> {
    None
  }
}

/// The bus: an ordered collection of memory-mapped devices. Reads and
/// writes are routed to the first device whose range contains the address.
pub struct AddressSpace {
  devices: Vec<Box<dyn MemoryDevice>>,
}

impl AddressSpace {
  pub fn new() -> AddressSpace {
    AddressSpace { devices: Vec::new() }
  }

  pub fn add_device(&mut self, device: Box<dyn MemoryDevice>) {
    self.devices.push(device);
  }

  /// Read a byte at `addr`. An unmapped address is logged and reads as
  /// the sentinel 0xFF.
  pub fn read(&mut self, addr: u16) -> u8 {
    match self.find(addr) {
      Some(device) => device.read(addr),
      None => {
        warn!("no device mapped at 0x{:04X}, reading 0xFF", addr);
        0xff
      }
    }
  }

  /// Write a byte at `addr`. An unmapped address is logged and the write
  /// dropped; a write to a read-only device is fatal to the program.
  pub fn write(&mut self, addr: u16, value: u8) -> Result<(), Termination> {
    match self.find(addr) {
      Some(device) => device.write(addr, value),
      None => {
        warn!("no device mapped at 0x{:04X}, dropping write", addr);
        Ok(())
      }
    }
  }

  /// Rendered view of the display device, if one is wired.
  pub fn render_display(&self) -> Option<String> {
    self.devices.iter().find_map(|d| d.render())
  }

  fn find(&mut self, addr: u16) -> Option<&mut Box<dyn MemoryDevice>> {
    self.devices.iter_mut().find(|d| d.contains(addr))
  }
}
