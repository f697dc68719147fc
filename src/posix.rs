//! Thin wrappers around the libc calls the launcher needs.
//!
//! Every wrapper turns the usual `-1` + errno convention into an
//! `io::Result`, so callers can propagate failures with `?`.

use std::ffi::{CString, OsStr};
use std::fs::File;
use std::io::{Error, Result};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{FromRawFd, RawFd};
use std::ptr;

use crate::status::ExitStatus;

pub use libc::{EINTR, EINVAL};

/// The signal delivered when writing to a pipe whose reader is gone.
pub const SIGPIPE: u8 = libc::SIGPIPE as u8;

fn check_err<T: Ord + Default>(num: T) -> Result<T> {
    if num < T::default() {
        return Err(Error::last_os_error());
    }
    Ok(num)
}

/// Creates an anonymous pipe and returns its (read, write) ends as owned
/// files, so every endpoint gets closed exactly once, wherever it ends up.
///
/// Neither end carries `FD_CLOEXEC`: children are meant to inherit them
/// across exec.
pub fn pipe() -> Result<(File, File)> {
    let mut fds = [0 as libc::c_int; 2];
    check_err(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
    Ok(unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) })
}

pub fn fork() -> Result<u32> {
    check_err(unsafe { libc::fork() }).map(|pid| pid as u32)
}

fn os_to_cstring(s: &OsStr) -> Result<CString> {
    let bytes = s.as_bytes();
    if bytes.iter().any(|&b| b == 0) {
        return Err(Error::from_raw_os_error(libc::EINVAL));
    }
    Ok(CString::new(bytes)
        // not expected to fail on Unix, as Unix paths *are* C strings
        .expect("converting Unix path to C string"))
}

fn cstring_ptr(s: &CString) -> *const libc::c_char {
    &s.as_bytes_with_nul()[0] as *const u8 as _
}

/// Replaces the current process image with `cmd`, located via `PATH`.
/// Returns only on failure.
pub fn execvp<S1, S2>(cmd: S1, args: &[S2]) -> Result<()>
where
    S1: AsRef<OsStr>,
    S2: AsRef<OsStr>,
{
    let args_cstring: Vec<CString> = args
        .iter()
        .map(|x| os_to_cstring(x.as_ref()))
        .collect::<Result<_>>()?;
    let mut args_ptr: Vec<*const libc::c_char> = args_cstring.iter().map(cstring_ptr).collect();
    args_ptr.push(ptr::null());

    let cmd_cstring = os_to_cstring(cmd.as_ref())?;
    check_err(unsafe { libc::execvp(cstring_ptr(&cmd_cstring), args_ptr.as_ptr()) })?;

    Ok(())
}

/// Exits immediately, skipping atexit handlers and destructors. The only
/// way out of a forked child whose exec failed.
pub fn _exit(status: u8) -> ! {
    unsafe { libc::_exit(status as libc::c_int) }
}

pub fn dup2(oldfd: RawFd, newfd: RawFd) -> Result<()> {
    check_err(unsafe { libc::dup2(oldfd, newfd) })?;
    Ok(())
}

pub fn close(fd: RawFd) -> Result<()> {
    check_err(unsafe { libc::close(fd) })?;
    Ok(())
}

/// Waits for the given child, blocking unless `flags` contains `WNOHANG`.
pub fn waitpid(pid: u32, flags: i32) -> Result<(u32, ExitStatus)> {
    let mut status = 0 as libc::c_int;
    let pid = check_err(unsafe {
        libc::waitpid(
            pid as libc::pid_t,
            &mut status as *mut libc::c_int,
            flags as libc::c_int,
        )
    })?;
    Ok((pid as u32, decode_exit_status(status)))
}

fn decode_exit_status(status: i32) -> ExitStatus {
    if libc::WIFEXITED(status) {
        ExitStatus::Exited(libc::WEXITSTATUS(status) as u32)
    } else if libc::WIFSIGNALED(status) {
        ExitStatus::Signaled(libc::WTERMSIG(status) as u8)
    } else {
        ExitStatus::Other(status)
    }
}

/// Ignores SIGPIPE in the calling process. The launcher must not die from
/// a broken pipe; stages that do are reported through their wait status.
pub fn ignore_sigpipe() -> Result<()> {
    unsafe {
        let ret = libc::signal(libc::SIGPIPE, libc::SIG_IGN);
        if ret == libc::SIG_ERR {
            return Err(Error::last_os_error());
        }
    }
    Ok(())
}

/// Restores the signal state Unix programs expect: an empty signal mask
/// and the default SIGPIPE disposition. Called between fork and exec.
///
/// Ignored signals survive exec, so without this a stage would inherit the
/// launcher's ignored SIGPIPE and see write errors instead of dying
/// quietly when its reader goes away.
pub fn reset_signals() -> Result<()> {
    unsafe {
        let mut set = MaybeUninit::<libc::sigset_t>::uninit();
        check_err(libc::sigemptyset(set.as_mut_ptr()))?;
        check_err(libc::pthread_sigmask(
            libc::SIG_SETMASK,
            set.as_ptr(),
            ptr::null_mut(),
        ))?;
        let ret = libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        if ret == libc::SIG_ERR {
            return Err(Error::last_os_error());
        }
    }
    Ok(())
}
