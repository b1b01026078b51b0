//! Connectors that execute commands against the VCM service

use super::Command;
use crate::error::{IngestError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Stdio};
use tracing::{debug, warn};

/// Executes VCM commands
///
/// `connect` acquires whatever the connector needs before the first command;
/// `release` gives it back. Both are called once per session.
pub trait Connector {
    fn connect(&mut self) -> Result<()>;

    fn execute(&mut self, command: &Command) -> Result<Response>;

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<C: Connector + ?Sized> Connector for Box<C> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn execute(&mut self, command: &Command) -> Result<Response> {
        (**self).execute(command)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

/// The response to an executed command
///
/// Holds a forward-only stream of JSON-lines work items. A child process
/// behind the stream is killed and reaped on drop unless [`Response::close`]
/// released it first.
pub struct Response {
    command_line: String,
    reader: Box<dyn BufRead>,
    child: Option<Child>,
}

impl Response {
    pub fn from_reader(command_line: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        Self {
            command_line: command_line.into(),
            reader: Box::new(reader),
            child: None,
        }
    }

    fn from_child(command_line: String, mut child: Child) -> Result<Self> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| IngestError::query(command_line.as_str(), "child stdout not captured"))?;
        Ok(Self {
            command_line,
            reader: Box::new(BufReader::new(stdout)),
            child: Some(child),
        })
    }

    /// The complete command this response was produced by
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// The raw work-item stream
    pub fn reader(&mut self) -> &mut dyn BufRead {
        &mut *self.reader
    }

    /// Release the stream and, for a child process, check its exit status
    pub fn close(mut self) -> Result<()> {
        self.reader = Box::new(std::io::empty());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| IngestError::query(self.command_line.as_str(), e))?;
        if !status.success() {
            return Err(IngestError::query(
                self.command_line.as_str(),
                format!("command exited with {status}"),
            ));
        }
        Ok(())
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            if let Err(e) = child.wait() {
                warn!(command = %self.command_line, error = %e, "failed to reap VCM command");
            }
        }
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("command_line", &self.command_line)
            .field("child", &self.child.as_ref().map(Child::id))
            .finish()
    }
}

// ==================== Process ====================

/// Runs commands through an external client program
///
/// The program receives the command name and options as arguments and must
/// write one JSON work item per line to stdout.
#[derive(Debug, Clone)]
pub struct ProcessConnector {
    program: String,
    args: Vec<String>,
    search_path: Option<OsString>,
    resolved: Option<PathBuf>,
}

impl ProcessConnector {
    /// `args` are passed ahead of the command name
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            search_path: None,
            resolved: None,
        }
    }

    /// Look the program up in these directories instead of `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    fn locate(&self) -> Result<PathBuf> {
        let resource = || format!("VCM client {:?}", self.program);
        let found = match &self.search_path {
            None => which::which(&self.program),
            Some(paths) => {
                let cwd = std::env::current_dir()
                    .map_err(|e| IngestError::environment(resource(), e))?;
                which::which_in(&self.program, Some(paths), cwd)
            }
        };
        found.map_err(|e| IngestError::environment(resource(), e))
    }
}

impl Connector for ProcessConnector {
    fn connect(&mut self) -> Result<()> {
        let resolved = self.locate()?;
        debug!(program = %resolved.display(), "VCM client resolved");
        self.resolved = Some(resolved);
        Ok(())
    }

    fn execute(&mut self, command: &Command) -> Result<Response> {
        command.validate()?;
        let command_line = command.complete_command();

        let program = self.resolved.as_ref().ok_or_else(|| {
            IngestError::query(command_line.as_str(), "connector is not connected")
        })?;

        let child = std::process::Command::new(program)
            .args(&self.args)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| IngestError::query(command_line.as_str(), e))?;

        Response::from_child(command_line, child)
    }

    fn release(&mut self) -> Result<()> {
        self.resolved = None;
        Ok(())
    }
}

// ==================== Replay ====================

/// Serves a previously captured response file
///
/// Every command receives the same work items; the command line is kept for
/// diagnostics only.
#[derive(Debug, Clone)]
pub struct ReplayConnector {
    path: PathBuf,
}

impl ReplayConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Connector for ReplayConnector {
    fn connect(&mut self) -> Result<()> {
        if !self.path.is_file() {
            return Err(IngestError::environment(
                format!("response file {:?}", self.path),
                "not a readable file",
            ));
        }
        Ok(())
    }

    fn execute(&mut self, command: &Command) -> Result<Response> {
        command.validate()?;
        let command_line = command.complete_command();
        let file = File::open(&self.path).map_err(|e| {
            IngestError::query(command_line.as_str(), format!("{:?}: {e}", self.path))
        })?;
        Ok(Response::from_reader(command_line, BufReader::new(file)))
    }
}
