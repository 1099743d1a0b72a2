use std::io;
use std::io::Write;

use log::warn;

/// Supplies one externally-sourced keyboard token per read. A read blocks
/// the calling thread until a token is available.
pub trait InputSource: Send {
  fn read_token(&mut self) -> String;
}

/// Line-oriented tokens from stdin.
pub struct StdinSource;

impl InputSource for StdinSource {
  fn read_token(&mut self) -> String {
    print!("keyboard> ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
      warn!("failed to read from stdin, substituting an empty token");
      line.clear();
    }
    line
  }
}

/// Feeds pre-baked tokens, for driving keyboard reads in tests.
#[cfg(test)]
pub struct ScriptedSource {
  tokens: std::collections::VecDeque<String>,
}

#[cfg(test)]
impl ScriptedSource {
  pub fn new(tokens: &[&str]) -> ScriptedSource {
    ScriptedSource {
      tokens: tokens.iter().map(|t| t.to_string()).collect(),
    }
  }
}

#[cfg(test)]
impl InputSource for ScriptedSource {
  fn read_token(&mut self) -> String {
    self.tokens.pop_front().unwrap_or_default()
  }
}
