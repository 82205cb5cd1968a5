//! Constants shared across the crate.

pub const APP_NAME: &str = "bookmake";

/// Default configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "book.toml";

/// Environment variable naming the X display.
pub const DISPLAY_ENV: &str = "DISPLAY";

/// Display number the virtual framebuffer is bound to.
pub const VIRTUAL_DISPLAY: &str = ":42";

/// Process name of the virtual framebuffer, as listed in the process table.
pub const XVFB_PROCESS: &str = "Xvfb";

/// Flag the diagram converter only honours after its input file.
pub const NO_SANDBOX_FLAG: &str = "--no-sandbox";
