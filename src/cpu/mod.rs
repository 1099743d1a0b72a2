mod ops;

#[cfg(test)]
mod optest;

pub use self::ops::{ascii_digit, Instruction};

use crate::error::Termination;
use crate::mem::display;
use crate::mem::AddressSpace;
use crate::reg::Registers;
use crate::timer::TimerClock;

/// Bus addresses the CPU itself needs: where a keyboard read goes and
/// where the display buffer starts.
#[derive(Debug, Clone, Copy)]
pub struct IoMap {
  pub keyboard: u16,
  pub display: u16,
}

/// The execution engine: fetches at P, decodes, and executes one
/// instruction per step.
pub struct Cpu {
  pub regs: Registers,
  timer: TimerClock,
  io: IoMap,
}

impl Cpu {
  pub fn new(timer: TimerClock, io: IoMap) -> Cpu {
    Cpu {
      regs: Registers::new(timer.value_handle()),
      timer,
      io,
    }
  }

  /// Run one fetch-decode-execute cycle. A cycle either completes fully
  /// or terminates the program with a diagnostic.
  pub fn step(&mut self, mem: &mut AddressSpace) -> Result<(), Termination> {
    let pc = self.regs.p;
    let byte1 = mem.read(pc);
    let byte2 = mem.read(pc.wrapping_add(1));
    let instruction = Instruction::decode(byte1, byte2, pc)?;
    let step = self.exec(instruction, mem)?;
    self.regs.p = self.regs.p.wrapping_add(step);
    Ok(())
  }

  fn exec(&mut self, instruction: Instruction, mem: &mut AddressSpace) -> Result<u16, Termination> {
    match instruction {
      Instruction::Store { rx, bb } => {
        self.regs.set_r(rx, bb)?;
      }
      Instruction::Add { rx, ry, rz } => {
        let result = self.regs.r(rx)?.wrapping_add(self.regs.r(ry)?);
        self.regs.set_r(rz, result)?;
      }
      Instruction::Sub { rx, ry, rz } => {
        let result = self.regs.r(rx)?.wrapping_sub(self.regs.r(ry)?);
        self.regs.set_r(rz, result)?;
      }
      Instruction::Read { rx } => {
        let value = mem.read(self.regs.a);
        self.regs.set_r(rx, value)?;
      }
      Instruction::Write { rx } => {
        mem.write(self.regs.a, self.regs.r(rx)?)?;
      }
      Instruction::Jump { target } => {
        if target % 2 != 0 {
          return Err(Termination::OddJump { target });
        }
        self.regs.p = target;
      }
      Instruction::ReadKeyboard { rx } => {
        // blocks until the keyboard produces a byte
        let value = mem.read(self.io.keyboard);
        self.regs.set_r(rx, value)?;
      }
      Instruction::SwitchMemory => {
        self.regs.m = !self.regs.m;
      }
      Instruction::SkipEqual { rx, ry } => {
        let step = if self.regs.r(rx)? == self.regs.r(ry)? { 4 } else { 2 };
        return Ok(step);
      }
      Instruction::SkipNotEqual { rx, ry } => {
        let step = if self.regs.r(rx)? != self.regs.r(ry)? { 4 } else { 2 };
        return Ok(step);
      }
      Instruction::SetA { value } => {
        self.regs.a = value;
      }
      Instruction::SetT { bb } => {
        self.timer.set_timer_value(bb);
      }
      Instruction::ReadT { rx } => {
        let value = self.regs.t();
        self.regs.set_r(rx, value)?;
      }
      Instruction::ConvertToBase10 { rx } => {
        let value = self.regs.r(rx)?;
        let a = self.regs.a;
        mem.write(a, value / 100)?;
        mem.write(a.wrapping_add(1), (value % 100) / 10)?;
        mem.write(a.wrapping_add(2), value % 10)?;
      }
      Instruction::ConvertByteToAscii { rx, ry } => {
        let value = self.regs.r(rx)?;
        let ascii = ascii_digit(value).ok_or(Termination::AsciiOutOfRange { value })?;
        self.regs.set_r(ry, ascii)?;
      }
      Instruction::Draw { rx, ry, rz } => {
        let code = self.regs.r(rx)?;
        let row = self.regs.r(ry)?;
        let col = self.regs.r(rz)?;
        if code > 0x7f {
          return Err(Termination::DrawBadChar { value: code });
        }
        if row as usize >= display::HEIGHT || col as usize >= display::WIDTH {
          return Err(Termination::DrawOffScreen { row, col });
        }
        let offset = u16::from(row) * display::WIDTH as u16 + u16::from(col);
        mem.write(self.io.display.wrapping_add(offset), code)?;
        if let Some(screen) = mem.render_display() {
          println!("{}", screen);
        }
      }
    }
    Ok(instruction.pc_step())
  }
}
