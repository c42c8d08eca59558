//! Pseudo terminal processes
//!
//! The multiplexer only sees the `Spawner` and `Process` traits. The real
//! implementation opens a pty per command with `portable-pty` and runs one
//! reader thread per process that forwards output and the final exit code
//! to the event loop over a single channel.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize, PtySystem};
use thiserror::Error;

/// Identity of one spawned process (unique for the program lifetime)
pub type ProcessId = u64;

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("failed to open pty: {0}")]
    Open(String),

    #[error("failed to spawn process: {0}")]
    Spawn(String),

    #[error("failed to resize pty: {0}")]
    Resize(String),

    #[error("failed to write to pty: {0}")]
    Write(#[source] io::Error),

    #[error("failed to kill process: {0}")]
    Kill(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, PtyError>;

/// Events delivered from process reader threads to the event loop
#[derive(Debug)]
pub enum PaneEvent {
    /// A chunk of output
    Output {
        pane: usize,
        process: ProcessId,
        data: Vec<u8>,
    },
    /// The process has exited; sent once, after all of its output
    Exited {
        pane: usize,
        process: ProcessId,
        code: u32,
    },
}

/// Everything needed to launch one command
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub shell: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub cols: u16,
    pub rows: u16,
}

impl SpawnRequest {
    /// Run `cmd` through the platform shell
    pub fn shell_command(cmd: &str, cwd: Option<&Path>, cols: u16, rows: u16) -> Self {
        let (shell, mut args) = default_shell();
        args.push(cmd.to_string());
        let cwd = match cwd {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        Self {
            shell,
            args,
            cwd,
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }
}

#[cfg(windows)]
fn default_shell() -> (String, Vec<String>) {
    (
        "cmd.exe".to_string(),
        vec!["/d".to_string(), "/s".to_string(), "/c".to_string()],
    )
}

#[cfg(not(windows))]
fn default_shell() -> (String, Vec<String>) {
    ("sh".to_string(), vec!["-c".to_string()])
}

/// A running child process attached to a pane
pub trait Process {
    fn id(&self) -> ProcessId;

    /// Send raw input bytes
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Inject an interrupt (Ctrl+C)
    fn interrupt(&mut self) -> Result<()> {
        self.write(&[0x03])
    }

    /// Hard-terminate the process
    fn terminate(&mut self) -> Result<()>;

    fn resize(&mut self, cols: u16, rows: u16) -> Result<()>;
}

/// Launches processes for panes
pub trait Spawner {
    fn spawn(&mut self, pane: usize, request: &SpawnRequest) -> Result<Box<dyn Process>>;
}

/// Spawner backed by the native pty system
pub struct PtySpawner {
    system: Box<dyn PtySystem + Send>,
    events: Sender<PaneEvent>,
    next_id: ProcessId,
}

impl PtySpawner {
    pub fn new(events: Sender<PaneEvent>) -> Self {
        Self {
            system: native_pty_system(),
            events,
            next_id: 1,
        }
    }
}

impl Spawner for PtySpawner {
    fn spawn(&mut self, pane: usize, request: &SpawnRequest) -> Result<Box<dyn Process>> {
        let size = PtySize {
            rows: request.rows,
            cols: request.cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        let pair = self
            .system
            .openpty(size)
            .map_err(|e| PtyError::Open(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&request.shell);
        cmd.args(&request.args);
        cmd.cwd(&request.cwd);

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::Spawn(e.to_string()))?;
        // The child holds its own copy of the slave side
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::Open(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::Open(e.to_string()))?;
        let killer = child.clone_killer();

        let id = self.next_id;
        self.next_id += 1;

        let events = self.events.clone();
        thread::spawn(move || {
            let mut buffer = [0u8; 8192];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        let event = PaneEvent::Output {
                            pane,
                            process: id,
                            data: buffer[..n].to_vec(),
                        };
                        if events.send(event).is_err() {
                            return;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }

            let code = match child.wait() {
                Ok(status) => status.exit_code(),
                Err(e) => {
                    tracing::warn!("wait failed for process {}: {}", id, e);
                    1
                }
            };
            let _ = events.send(PaneEvent::Exited {
                pane,
                process: id,
                code,
            });
        });

        tracing::debug!(
            "spawned process {} for pane {}: {} {:?} in {}",
            id,
            pane,
            request.shell,
            request.args,
            request.cwd.display()
        );

        Ok(Box::new(PtyProcess {
            id,
            master: pair.master,
            writer,
            killer,
        }))
    }
}

struct PtyProcess {
    id: ProcessId,
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    killer: Box<dyn ChildKiller + Send + Sync>,
}

impl Process for PtyProcess {
    fn id(&self) -> ProcessId {
        self.id
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).map_err(PtyError::Write)?;
        self.writer.flush().map_err(PtyError::Write)
    }

    fn terminate(&mut self) -> Result<()> {
        self.killer.kill().map_err(PtyError::Kill)
    }

    fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        self.master
            .resize(PtySize {
                rows: rows.max(1),
                cols: cols.max(1),
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Resize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(windows))]
    fn test_shell_command_posix() {
        let req = SpawnRequest::shell_command("make test", Some(Path::new("/tmp")), 80, 24);
        assert_eq!(req.shell, "sh");
        assert_eq!(req.args, vec!["-c".to_string(), "make test".to_string()]);
        assert_eq!(req.cwd, PathBuf::from("/tmp"));
    }

    #[test]
    #[cfg(windows)]
    fn test_shell_command_windows() {
        let req = SpawnRequest::shell_command("dir", None, 80, 24);
        assert_eq!(req.shell, "cmd.exe");
        assert_eq!(req.args.last().map(String::as_str), Some("dir"));
    }

    #[test]
    fn test_shell_command_defaults_to_host_cwd() {
        let req = SpawnRequest::shell_command("true", None, 0, 0);
        assert_eq!(req.cwd, std::env::current_dir().unwrap());
        assert_eq!((req.cols, req.rows), (1, 1));
    }
}
