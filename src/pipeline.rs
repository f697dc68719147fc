//! The pipeline orchestration core: pipe plumbing, forking discipline,
//! and reaping.

use std::error::Error;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;

use log::{debug, trace};

use crate::posix;
use crate::status::ExitStatus;

/// Result of pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error setting up or running a pipeline.
///
/// Failures of the *stages themselves* are not errors: they come back as
/// [`ExitStatus`] values from [`Pipeline::run`]. This type covers the
/// launcher's own failures, before or between the stages.
#[derive(Debug)]
pub enum PipelineError {
    /// The pipeline contains no programs.
    Empty,
    /// A pipe could not be allocated or a stage could not be forked.
    Io(io::Error),
}

impl PipelineError {
    /// The process exit code this error maps to: `EINVAL` for an empty
    /// pipeline, otherwise the underlying raw OS error where there is one.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Empty => posix::EINVAL,
            PipelineError::Io(err) => err.raw_os_error().unwrap_or(1),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Empty => write!(f, "pipeline needs at least one program"),
            PipelineError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Empty => None,
            PipelineError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> PipelineError {
        PipelineError::Io(err)
    }
}

/// A linear pipeline of programs, connected stdout-to-stdin like a
/// shell's `a | b | c`.
///
/// The first stage reads the launcher's standard input, the last one
/// writes its standard output. Each stage is a bare program name located
/// via `PATH` and run with no arguments of its own, in the unchanged
/// parent environment.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> plumb::Result<()> {
/// use plumb::{pipeline_exit_code, Pipeline};
///
/// let statuses = Pipeline::new(&["cat", "sort", "uniq"]).run()?;
/// assert_eq!(pipeline_exit_code(&statuses), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<OsString>,
}

impl Pipeline {
    /// Creates a pipeline from program names in stage order.
    pub fn new<S: AsRef<OsStr>>(programs: &[S]) -> Pipeline {
        Pipeline {
            stages: programs.iter().map(|p| p.as_ref().to_owned()).collect(),
        }
    }

    /// Spawns every stage, waits for all of them, and returns their exit
    /// statuses in stage order.
    ///
    /// All stages are spawned before any is awaited, and every parent-held
    /// pipe endpoint is closed before the first wait. When a fork fails
    /// midway, the already-spawned stages are still reaped before the
    /// error is returned.
    pub fn run(&self) -> Result<Vec<ExitStatus>> {
        if self.stages.is_empty() {
            return Err(PipelineError::Empty);
        }

        posix::ignore_sigpipe()?;

        let channels = make_channels(self.stages.len() - 1)?;

        let mut pids: Vec<u32> = Vec::with_capacity(self.stages.len());
        let mut spawn_err = None;
        for (i, program) in self.stages.iter().enumerate() {
            match spawn_stage(program, i, &channels) {
                Ok(pid) => {
                    trace!(
                        "stage {} ({}) spawned as pid {}",
                        i,
                        program.to_string_lossy(),
                        pid
                    );
                    pids.push(pid);
                }
                Err(err) => {
                    spawn_err = Some(err);
                    break;
                }
            }
        }

        // Dropping the channel endpoints here, after the last spawn and
        // before the first wait, is what lets EOF travel down the
        // pipeline: a read end still open in the launcher would keep its
        // stage from ever seeing end-of-input, and a write end would do
        // the same one stage further down.
        drop(channels);

        debug!("spawned {} of {} stages", pids.len(), self.stages.len());

        // Reap unconditionally: even after a failed fork, no child may be
        // left unwaited.
        let statuses = reap_all(&pids);
        if let Some(err) = spawn_err {
            return Err(PipelineError::Io(err));
        }
        statuses
    }
}

/// Allocates the pipes bridging adjacent stages: channel `i` carries
/// stage `i`'s output to stage `i + 1`'s input. On a partial failure the
/// endpoints already open close on drop.
fn make_channels(count: usize) -> io::Result<Vec<(File, File)>> {
    (0..count).map(|_| posix::pipe()).collect()
}

/// Forks one stage. The child never returns from here: it either execs
/// the program or reports the failure and `_exit`s.
fn spawn_stage(program: &OsStr, index: usize, channels: &[(File, File)]) -> io::Result<u32> {
    let pid = posix::fork()?;
    if pid == 0 {
        let err = exec_stage(program, index, channels);
        // Still in the forked child: report the program that failed to
        // launch on the inherited stderr, then exit with the shell's
        // convention for launch failures.
        let _ = writeln!(
            io::stderr(),
            "{}: {}: {}",
            env!("CARGO_PKG_NAME"),
            program.to_string_lossy(),
            err
        );
        let code = if err.kind() == io::ErrorKind::NotFound {
            127
        } else {
            126
        };
        posix::_exit(code);
    }
    Ok(pid)
}

/// Child-side setup and exec. Only returns on failure, with the error
/// that stopped the launch.
fn exec_stage(program: &OsStr, index: usize, channels: &[(File, File)]) -> io::Error {
    // Wire this stage into the pipeline: stdin from the channel behind
    // it, stdout into the channel ahead of it. The first and last stages
    // keep the launcher's own stdin and stdout.
    if index > 0 {
        if let Err(err) = posix::dup2(channels[index - 1].0.as_raw_fd(), 0) {
            return err;
        }
    }
    if index < channels.len() {
        if let Err(err) = posix::dup2(channels[index].1.as_raw_fd(), 1) {
            return err;
        }
    }

    // Shed every inherited channel endpoint, including the originals just
    // duplicated onto stdin/stdout. Pipes stay open through exec, so one
    // leaked write end would keep a downstream stage from ever seeing EOF.
    for (read, write) in channels {
        let _ = posix::close(read.as_raw_fd());
        let _ = posix::close(write.as_raw_fd());
    }

    if let Err(err) = posix::reset_signals() {
        return err;
    }

    match posix::execvp(program, &[program]) {
        Ok(()) => unreachable!(),
        Err(err) => err,
    }
}

/// Waits for every spawned child exactly once, in stage order, and
/// collects the decoded statuses.
fn reap_all(pids: &[u32]) -> Result<Vec<ExitStatus>> {
    let mut statuses = Vec::with_capacity(pids.len());
    let mut first_err: Option<io::Error> = None;
    for &pid in pids {
        match wait_for(pid) {
            Ok(status) => {
                trace!("pid {} finished: {:?}", pid, status);
                statuses.push(status);
            }
            Err(err) => {
                // Keep going: the remaining children still get their wait.
                statuses.push(ExitStatus::Other(-1));
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
    }
    match first_err {
        Some(err) => Err(PipelineError::Io(err)),
        None => Ok(statuses),
    }
}

fn wait_for(pid: u32) -> io::Result<ExitStatus> {
    loop {
        match posix::waitpid(pid, 0) {
            Ok((_, status)) => return Ok(status),
            Err(err) if err.raw_os_error() == Some(posix::EINTR) => continue,
            Err(err) => return Err(err),
        }
    }
}
