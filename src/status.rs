//! Exit statuses of pipeline stages and their folding into the overall
//! pipeline exit code.

use crate::posix;

/// Exit status of a reaped stage, as decoded from `waitpid(2)`.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ExitStatus {
    /// The stage exited normally with the given exit code.
    Exited(u32),
    /// The stage was terminated by the given signal.
    Signaled(u8),
    /// Anything else reported by `waitpid(2)`.
    Other(i32),
}

impl ExitStatus {
    /// True if the stage counts as successful.
    ///
    /// Death by SIGPIPE is a success: it is how the upstream side of a
    /// pipeline normally ends when the downstream command stops reading
    /// early, as in `yes | head`.
    pub fn success(&self) -> bool {
        self.exit_code() == 0
    }

    /// Maps the status to a shell-style exit code in `0..=255`.
    ///
    /// Normal exits keep their code, SIGPIPE death maps to 0, and any
    /// other fatal signal maps to 128 plus the signal number, the way
    /// shells report it.
    pub fn exit_code(&self) -> u8 {
        match *self {
            ExitStatus::Exited(code) => code as u8,
            ExitStatus::Signaled(posix::SIGPIPE) => 0,
            ExitStatus::Signaled(sig) => 128 + sig,
            ExitStatus::Other(_) => 255,
        }
    }
}

/// Exit code for the pipeline as a whole: the code of the first
/// (lowest-indexed) stage that failed, or 0 when every stage succeeded.
///
/// Reporting the first failure rather than the last surfaces the stage
/// that actually broke; everything downstream of it typically just saw
/// empty input and exited quietly.
pub fn pipeline_exit_code(statuses: &[ExitStatus]) -> u8 {
    statuses
        .iter()
        .map(ExitStatus::exit_code)
        .find(|&code| code != 0)
        .unwrap_or(0)
}
