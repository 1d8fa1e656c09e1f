//! Lifecycle of the detached dashboard server process.
//!
//! The supervisor walks `Idle → ServerStarting → ServerRunning →
//! ConfirmPending → Terminating → Exited`. A pending close can be cancelled
//! back to `ServerRunning`. A server that dies on its own moves straight to
//! `Exited`.

use std::{
    ffi::OsString,
    io,
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(3000);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    ServerStarting,
    ServerRunning,
    ConfirmPending,
    Terminating,
    Exited,
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to signal dashboard server: {0}")]
    Signal(String),
    #[error("failed to wait for dashboard server: {0}")]
    Wait(#[source] io::Error),
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SupervisorState,
    },
}

/// Program and arguments used to start the server.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ServerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

pub struct Supervisor {
    command: ServerCommand,
    grace_period: Duration,
    state: SupervisorState,
    child: Option<Child>,
    exit_status: Option<ExitStatus>,
}

impl Supervisor {
    pub fn new(command: ServerCommand, grace_period: Duration) -> Self {
        Self {
            command,
            grace_period,
            state: SupervisorState::Idle,
            child: None,
            exit_status: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Exit status of the server once it has been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    pub fn server_pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Spawns the server without waiting for it to become ready.
    pub fn launch(&mut self) -> Result<(), SupervisorError> {
        self.expect_state("launch", &[SupervisorState::Idle])?;
        self.state = SupervisorState::ServerStarting;

        let spawned = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => {
                info!(
                    pid = child.id(),
                    program = %self.command.program.display(),
                    "dashboard server started"
                );
                self.child = Some(child);
                self.state = SupervisorState::ServerRunning;
                Ok(())
            }
            Err(source) => {
                self.state = SupervisorState::Exited;
                Err(SupervisorError::Spawn {
                    program: self.command.program.display().to_string(),
                    source,
                })
            }
        }
    }

    /// Returns `true` when the close has to be confirmed first. A server
    /// that is already gone needs no confirmation.
    pub fn request_close(&mut self) -> Result<bool, SupervisorError> {
        match self.state {
            SupervisorState::ServerRunning => {
                self.state = SupervisorState::ConfirmPending;
                Ok(true)
            }
            SupervisorState::ConfirmPending => Ok(true),
            SupervisorState::Idle | SupervisorState::Exited => Ok(false),
            state => Err(SupervisorError::InvalidTransition {
                action: "request close",
                state,
            }),
        }
    }

    pub fn cancel_close(&mut self) -> Result<(), SupervisorError> {
        self.expect_state("cancel close", &[SupervisorState::ConfirmPending])?;
        self.state = SupervisorState::ServerRunning;
        Ok(())
    }

    /// Stops the server and blocks until it has been reaped.
    pub fn confirm_close(&mut self) -> Result<ExitStatus, SupervisorError> {
        self.expect_state("confirm close", &[SupervisorState::ConfirmPending])?;
        self.state = SupervisorState::Terminating;
        let result = self.terminate();
        self.state = SupervisorState::Exited;
        result
    }

    /// Notices a server that exited on its own. Returns the status only on
    /// the call that observed the exit.
    pub fn poll_server(&mut self) -> Option<ExitStatus> {
        if !matches!(
            self.state,
            SupervisorState::ServerRunning | SupervisorState::ConfirmPending
        ) {
            return None;
        }
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => {
                warn!(%status, "dashboard server exited unexpectedly");
                self.child = None;
                self.exit_status = Some(status);
                self.state = SupervisorState::Exited;
                Some(status)
            }
            Ok(None) => None,
            Err(error) => {
                debug!(%error, "could not poll dashboard server");
                None
            }
        }
    }

    /// Terminates and joins the server from any state.
    pub fn shutdown(&mut self) -> Result<(), SupervisorError> {
        if self.child.is_none() {
            self.state = SupervisorState::Exited;
            return Ok(());
        }
        self.state = SupervisorState::Terminating;
        let result = self.terminate().map(|_| ());
        self.state = SupervisorState::Exited;
        result
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: &[SupervisorState],
    ) -> Result<(), SupervisorError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SupervisorError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    fn terminate(&mut self) -> Result<ExitStatus, SupervisorError> {
        let Some(mut child) = self.child.take() else {
            return self.exit_status.ok_or(SupervisorError::InvalidTransition {
                action: "terminate",
                state: self.state,
            });
        };

        if let Some(status) = child.try_wait().map_err(SupervisorError::Wait)? {
            self.exit_status = Some(status);
            return Ok(status);
        }

        request_graceful_stop(&mut child)?;
        let deadline = Instant::now() + self.grace_period;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(SupervisorError::Wait)? {
                info!(%status, "dashboard server stopped");
                break status;
            }
            if Instant::now() >= deadline {
                warn!(
                    grace_period = ?self.grace_period,
                    "dashboard server ignored termination; killing"
                );
                if let Err(error) = child.kill() {
                    // InvalidInput means it exited between the poll and the kill.
                    if error.kind() != io::ErrorKind::InvalidInput {
                        return Err(SupervisorError::Signal(error.to_string()));
                    }
                }
                break child.wait().map_err(SupervisorError::Wait)?;
            }
            thread::sleep(POLL_INTERVAL);
        };

        self.exit_status = Some(status);
        Ok(status)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(error) = self.shutdown() {
                warn!(%error, "failed to stop dashboard server on drop");
            }
        }
    }
}

#[cfg(unix)]
fn request_graceful_stop(child: &mut Child) -> Result<(), SupervisorError> {
    use nix::{
        errno::Errno,
        sys::signal::{kill, Signal},
        unistd::Pid,
    };

    let pid = i32::try_from(child.id())
        .map_err(|_| SupervisorError::Signal(format!("pid {} out of range", child.id())))?;
    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(SupervisorError::Signal(errno.to_string())),
    }
}

#[cfg(not(unix))]
fn request_graceful_stop(child: &mut Child) -> Result<(), SupervisorError> {
    match child.kill() {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::InvalidInput => Ok(()),
        Err(error) => Err(SupervisorError::Signal(error.to_string())),
    }
}

#[cfg(test)]
#[path = "tests/supervisor_tests.rs"]
mod tests;
