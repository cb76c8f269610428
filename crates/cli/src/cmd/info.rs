use ptpack_lib::platform::paths::{scratch_dir, store_dir};
use ptpack_lib::platform::{Platform, PlatformSet};

use crate::output::print_stat;

pub fn cmd_info() {
  println!("ptpack {}", env!("CARGO_PKG_VERSION"));
  match Platform::current() {
    Some(host) => print_stat("Host platform", &host.to_string()),
    None => print_stat("Host platform", "unsupported"),
  }
  let supported: Vec<String> = PlatformSet::supported().iter().map(ToString::to_string).collect();
  print_stat("Supported", &supported.join(", "));
  print_stat("Store", &store_dir().display().to_string());
  print_stat("Scratch", &scratch_dir().display().to_string());
}
