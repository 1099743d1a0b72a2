mod cpu;
mod error;
mod input;
mod mem;
mod reg;
mod system;
mod timer;

use std::fs;

use anyhow::{bail, Context, Result};
use clap::{App, Arg};
use log::info;

use crate::input::StdinSource;
use crate::system::{MemoryLayout, System};

fn main() -> Result<()> {
  env_logger::init()?;

  let matches = App::new("d5700")
    .version("0.1.0")
    .about("Emulator for the D5700 8-bit computer")
    .arg(
      Arg::with_name("rom")
        .help("Path to the ROM image")
        .required(true)
        .index(1),
    )
    .arg(
      Arg::with_name("keyboard-base")
        .long("keyboard-base")
        .takes_value(true)
        .help("Bus address of the keyboard (hex, default 0x2000)"),
    )
    .arg(
      Arg::with_name("display-base")
        .long("display-base")
        .takes_value(true)
        .help("Bus address of the display (hex, default 0x2001)"),
    )
    .get_matches();

  let mut layout = MemoryLayout::default();
  if let Some(raw) = matches.value_of("keyboard-base") {
    layout.keyboard_base = parse_base(raw)?;
  }
  if let Some(raw) = matches.value_of("display-base") {
    layout.display_base = parse_base(raw)?;
  }

  let path = matches.value_of("rom").unwrap();
  let image =
    fs::read(path).with_context(|| format!("failed to read ROM image '{}'", path))?;
  info!("loaded {} byte ROM image from '{}'", image.len(), path);

  let mut system = System::new(layout);
  system.initialize(&image, Box::new(StdinSource));
  system.start();
  system.wait();
  Ok(())
}

fn parse_base(raw: &str) -> Result<u16> {
  let digits = raw
    .strip_prefix("0x")
    .or_else(|| raw.strip_prefix("0X"))
    .unwrap_or(raw);
  match u16::from_str_radix(digits, 16) {
    Ok(value) => Ok(value),
    Err(_) => bail!("invalid bus address '{}'", raw),
  }
}
