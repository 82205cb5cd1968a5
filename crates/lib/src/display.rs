//! Virtual display for headless diagram conversion.
//!
//! The diagram converter is an Electron application and needs an X display.
//! On hosts without one, an `Xvfb` server is started on a fixed display
//! before conversion and stopped afterwards.
//!
//! The service never trusts a remembered PID: every status query scans the
//! live process table by name, so a server restarted behind our back is still
//! seen. One display per host is assumed; concurrent builds race on it.

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::consts::{VIRTUAL_DISPLAY, XVFB_PROCESS};

/// How long a terminated server is given to exit before it is killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(10);
/// How long a killed server is given to disappear.
const KILL_TIMEOUT: Duration = Duration::from_secs(10);
/// Time allowed for a freshly spawned server to show up in the process table.
const START_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum DisplayError {
  #[error("failed to launch {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{program} did not start")]
  StartFailed { program: String },

  #[error("failed to stop {program} (pid {pid})")]
  StopFailed { program: String, pid: u32 },
}

/// How a process is asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
  Terminate,
  Kill,
}

/// Access to the host's process table.
pub trait ProcessTable {
  /// PID of a live process called `name`, if any.
  fn find(&mut self, name: &str) -> Option<u32>;

  /// Launch `program` with `args` in the background.
  fn spawn(&mut self, program: &str, args: &[String]) -> Result<(), DisplayError>;

  /// Send `signal` to `pid`. Returns false if the signal could not be sent.
  fn signal(&mut self, pid: u32, signal: StopSignal) -> bool;

  /// Wait until `pid` has exited, at most `timeout`. Returns true if it did.
  fn wait_exit(&mut self, pid: u32, timeout: Duration) -> bool;
}

/// Last observed state of the display server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
  NotChecked,
  Stopped,
  Running(u32),
}

/// The `Xvfb` virtual display.
pub struct DisplayService<T: ProcessTable> {
  table: T,
  state: DisplayState,
  start_timeout: Duration,
}

impl DisplayService<SystemProcessTable> {
  /// Service backed by the live process table.
  pub fn system() -> Self {
    Self::new(SystemProcessTable::new())
  }
}

impl<T: ProcessTable> DisplayService<T> {
  pub fn new(table: T) -> Self {
    Self {
      table,
      state: DisplayState::NotChecked,
      start_timeout: START_TIMEOUT,
    }
  }

  /// Override how long [`start`](Self::start) waits for the server to appear.
  pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
    self.start_timeout = timeout;
    self
  }

  /// Display name clients should connect to.
  pub fn display(&self) -> &'static str {
    VIRTUAL_DISPLAY
  }

  pub fn state(&self) -> DisplayState {
    self.state
  }

  pub fn table(&self) -> &T {
    &self.table
  }

  /// Re-scan the process table and return the server's PID.
  pub fn pid(&mut self) -> Option<u32> {
    let pid = self.table.find(XVFB_PROCESS);
    self.state = match pid {
      Some(pid) => DisplayState::Running(pid),
      None => DisplayState::Stopped,
    };
    pid
  }

  pub fn is_running(&mut self) -> bool {
    self.pid().is_some()
  }

  /// Start the server unless one is already running.
  ///
  /// Returns true if this call launched it.
  pub fn start(&mut self) -> Result<bool, DisplayError> {
    if let Some(pid) = self.pid() {
      debug!(pid, "{} is already running", XVFB_PROCESS);
      return Ok(false);
    }

    info!(display = VIRTUAL_DISPLAY, "starting {}", XVFB_PROCESS);
    let args = [VIRTUAL_DISPLAY, "-screen", "0", "1024x768x24"].map(String::from);
    self.table.spawn(XVFB_PROCESS, &args)?;

    let deadline = Instant::now() + self.start_timeout;
    loop {
      if let Some(pid) = self.pid() {
        debug!(pid, "{} started", XVFB_PROCESS);
        return Ok(true);
      }
      if Instant::now() >= deadline {
        error!("failed to start {}", XVFB_PROCESS);
        return Err(DisplayError::StartFailed {
          program: XVFB_PROCESS.to_string(),
        });
      }
      std::thread::sleep(POLL_INTERVAL);
    }
  }

  /// Stop the server: terminate, then kill if it survives.
  pub fn stop(&mut self) -> Result<(), DisplayError> {
    let Some(pid) = self.pid() else {
      debug!("{} is not running", XVFB_PROCESS);
      return Ok(());
    };

    info!(pid, "stopping {}", XVFB_PROCESS);
    self.table.signal(pid, StopSignal::Terminate);
    self.table.wait_exit(pid, TERMINATE_GRACE);
    let Some(pid) = self.pid() else {
      debug!("{} stopped", XVFB_PROCESS);
      return Ok(());
    };

    warn!(pid, "{} ignored termination, killing it", XVFB_PROCESS);
    self.table.signal(pid, StopSignal::Kill);
    self.table.wait_exit(pid, KILL_TIMEOUT);
    match self.pid() {
      None => {
        debug!("{} killed", XVFB_PROCESS);
        Ok(())
      }
      Some(pid) => {
        error!(pid, "failed to stop {}", XVFB_PROCESS);
        Err(DisplayError::StopFailed {
          program: XVFB_PROCESS.to_string(),
          pid,
        })
      }
    }
  }
}

/// [`ProcessTable`] over the live operating system process list.
pub struct SystemProcessTable {
  system: System,
  /// Servers we launched; kept so they can be reaped once they exit.
  children: Vec<Child>,
}

impl SystemProcessTable {
  pub fn new() -> Self {
    Self {
      system: System::new(),
      children: Vec::new(),
    }
  }

  fn refresh(&mut self) {
    self.reap();
    self
      .system
      .refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::nothing());
  }

  /// Collect exit statuses of our own children so they do not linger as
  /// zombies under the server's name.
  fn reap(&mut self) {
    self.children.retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
  }
}

impl Default for SystemProcessTable {
  fn default() -> Self {
    Self::new()
  }
}

impl ProcessTable for SystemProcessTable {
  fn find(&mut self, name: &str) -> Option<u32> {
    self.refresh();
    self
      .system
      .processes_by_exact_name(name.as_ref())
      .find(|p| !matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
      .map(|p| p.pid().as_u32())
  }

  fn spawn(&mut self, program: &str, args: &[String]) -> Result<(), DisplayError> {
    let child = Command::new(program)
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()
      .map_err(|source| DisplayError::Spawn {
        program: program.to_string(),
        source,
      })?;
    self.children.push(child);
    Ok(())
  }

  fn signal(&mut self, pid: u32, signal: StopSignal) -> bool {
    self.refresh();
    let Some(process) = self.system.process(Pid::from_u32(pid)) else {
      return false;
    };
    match signal {
      StopSignal::Terminate => process.kill_with(Signal::Term).unwrap_or(false),
      StopSignal::Kill => process.kill(),
    }
  }

  fn wait_exit(&mut self, pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
      self.refresh();
      let alive = self
        .system
        .process(Pid::from_u32(pid))
        .is_some_and(|p| !matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead));
      if !alive {
        return true;
      }
      if Instant::now() >= deadline {
        return false;
      }
      std::thread::sleep(POLL_INTERVAL);
    }
  }
}
