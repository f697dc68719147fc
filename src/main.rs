use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::process::exit;

use env_logger::Env;
use log::error;

use plumb::{pipeline_exit_code, Pipeline};

const NAME: &str = env!("CARGO_PKG_NAME");

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            let level = record.level().to_string().to_ascii_lowercase();
            writeln!(buf, "{}: {}: {}", NAME, level, record.args())
        })
        .init();

    let programs: Vec<OsString> = env::args_os().skip(1).collect();
    if programs.is_empty() {
        error!("usage: {} PROGRAM [PROGRAM ...]", NAME);
        exit(libc::EINVAL);
    }

    match Pipeline::new(&programs).run() {
        Ok(statuses) => exit(i32::from(pipeline_exit_code(&statuses))),
        Err(err) => {
            error!("{}", err);
            exit(err.exit_code());
        }
    }
}
