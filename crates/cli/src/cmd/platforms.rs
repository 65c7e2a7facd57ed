use anyhow::{Context, Result};

use xcpack_lib::platform::{self, Platform};

use crate::output::{OutputFormat, print_json, symbols};

pub fn cmd_platforms(os: &str, arch: &str, output: OutputFormat) -> Result<()> {
  let platforms = platform::select(os, arch).context("Failed to select target platforms")?;

  if output.is_json() {
    let names: Vec<String> = platforms.iter().map(Platform::to_string).collect();
    return print_json(&names);
  }

  for platform in &platforms {
    let marker = if platform.is_host() { symbols::ARROW } else { " " };
    println!("{} {}", marker, platform);
  }
  Ok(())
}
