/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use crate::Args;
use anyhow::Context;

#[cfg(debug_assertions)]
macro_rules! get_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_ansi(false)
    };
}

#[cfg(not(debug_assertions))]
macro_rules! get_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_thread_ids(false)
            .with_target(false)
            .with_ansi(false)
    };
}

/// Build the filter from the `--log-level` directives.
///
/// # Errors
///
/// * a directive is invalid
pub fn filter(directives: &[String]) -> anyhow::Result<tracing_subscriber::EnvFilter> {
    directives
        .iter()
        .try_fold(tracing_subscriber::EnvFilter::default(), |filter, directive| {
            Ok(filter.add_directive(
                directive
                    .parse()
                    .with_context(|| format!("invalid log directive '{directive}'"))?,
            ))
        })
}

/// Initialize the tracing subsystem.
///
/// The logs go to the file given with `--log-file`, to the standard output
/// with `--stdout`, and to the standard error when neither is given.
///
/// # Errors
///
/// * The log file path is invalid.
/// * A log directive is invalid.
/// * Failed to initialize the tracing subsystem.
pub fn initialize(args: &Args) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let writer_file = match &args.log_file {
        Some(path) => {
            let path = std::path::Path::new(path);
            if let (Some(directory), Some(file_name)) = (
                path.parent(),
                path.file_name().and_then(std::ffi::OsStr::to_str),
            ) {
                Some(tracing_appender::rolling::never(directory, file_name))
            } else {
                anyhow::bail!("filepath for logs at {path:?} does not have a parent or is not valid")
            }
        }
        None => None,
    };
    let to_stderr = writer_file.is_none() && !args.stdout;

    tracing_subscriber::registry()
        .with(filter(&args.log_level)?)
        .with(writer_file.map(|writer| get_fmt!().with_writer(writer)))
        .with(
            args.stdout
                .then(|| get_fmt!().with_writer(std::io::stdout).with_ansi(true)),
        )
        .with(to_stderr.then(|| get_fmt!().with_writer(std::io::stderr)))
        .try_init()
        .context("cannot initialize the logs")
}
