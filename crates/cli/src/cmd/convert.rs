use std::path::Path;

use anyhow::{Context, Result};

use bookmake_lib::HostContext;
use bookmake_lib::diagram::convert_diagrams;
use bookmake_lib::display::DisplayService;

use super::load_config;
use crate::output::{print_info, print_success};

pub fn cmd_convert_images(config_path: &Path, force: bool) -> Result<()> {
  let config = load_config(config_path)?;
  let host = HostContext::detect();
  let mut display = DisplayService::system();

  let report = convert_diagrams(&config, &host, &mut display, force).context("Diagram conversion failed")?;

  if report.converted.is_empty() {
    print_info(&format!("All {} diagram(s) up to date", report.up_to_date));
  } else {
    print_success(&format!(
      "Converted {} diagram(s), {} up to date",
      report.converted.len(),
      report.up_to_date
    ));
  }
  Ok(())
}
