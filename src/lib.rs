//! Launching of Unix process pipelines.
//!
//! The crate spawns one child process per program name, connects the
//! children stdout-to-stdin with anonymous pipes the way a shell does for
//! `a | b | c`, and waits for all of them. The first stage reads the
//! launcher's standard input, the last stage writes its standard output.
//! There is no parsing, no quoting, and no per-stage arguments: each
//! stage is a bare program located via `PATH`.
//!
//! A stage killed by SIGPIPE counts as successful, so pipelines like
//! `yes | head` shut down cleanly. The overall exit code is the first
//! failing stage's, mapped into `0..=255`.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> plumb::Result<()> {
//! use plumb::{pipeline_exit_code, Pipeline};
//!
//! let statuses = Pipeline::new(&["cat", "sort", "uniq"]).run()?;
//! assert_eq!(pipeline_exit_code(&statuses), 0);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod pipeline;
mod posix;
mod status;

pub use crate::pipeline::{Pipeline, PipelineError, Result};
pub use crate::status::{pipeline_exit_code, ExitStatus};

#[cfg(test)]
mod tests {
    mod pipeline;
    mod status;
}
