//! Writes the demo ROM: prints "ABC" on the top row, then forever echoes
//! each keyboard byte at row 1, column 0.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{App, Arg};

const ROM_SIZE: usize = 4096;

#[rustfmt::skip]
const PROGRAM: &[u8] = &[
  0x06, 0x00, // STORE r6, 0      row
  0x07, 0x00, // STORE r7, 0      column
  0x00, 0x41, // STORE r0, 'A'
  0xf0, 0x67, // DRAW r0, r6, r7
  0x07, 0x01, // STORE r7, 1
  0x00, 0x42, // STORE r0, 'B'
  0xf0, 0x67, // DRAW r0, r6, r7
  0x07, 0x02, // STORE r7, 2
  0x00, 0x43, // STORE r0, 'C'
  0xf0, 0x67, // DRAW r0, r6, r7
  0x60, 0x00, // READ_KEYBOARD r0    (address 0x0014)
  0x06, 0x01, // STORE r6, 1
  0x07, 0x00, // STORE r7, 0
  0xf0, 0x67, // DRAW r0, r6, r7
  0x50, 0x14, // JUMP 0x0014
];

fn main() -> Result<()> {
  let matches = App::new("mkrom")
    .about("Writes the demo ROM image for the D5700 emulator")
    .arg(
      Arg::with_name("output")
        .help("Where to write the image")
        .default_value("roms/demo.bin")
        .index(1),
    )
    .get_matches();

  let path = Path::new(matches.value_of("output").unwrap());
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
  }

  let mut image = vec![0u8; ROM_SIZE];
  image[..PROGRAM.len()].copy_from_slice(PROGRAM);
  fs::write(path, &image).with_context(|| format!("failed to write '{}'", path.display()))?;

  println!("wrote {} byte ROM to {}", image.len(), path.display());
  println!("program length: {} bytes", PROGRAM.len());
  Ok(())
}
