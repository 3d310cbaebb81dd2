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

/// Location of the store when none is given.
pub const DEFAULT_STORE: &str = "/etc/rcptproxy/store.toml";

///
#[non_exhaustive]
#[derive(clap::Parser)]
#[cfg_attr(test, derive(Debug, PartialEq, Eq))]
#[clap(about, author)]
pub struct Args {
    /// Print the version and exit.
    #[clap(short, long, action)]
    pub version: bool,

    /// Path of the settings store (toml format)
    #[clap(short, long, action, default_value = DEFAULT_STORE)]
    pub config: String,

    /// Write the logs to the standard output.
    #[clap(long, action)]
    pub stdout: bool,

    /// Write the logs to this file.
    #[clap(long, action)]
    pub log_file: Option<String>,

    /// Logs filtering directives (ex: "warn" or "rcptproxy_protocol=trace")
    #[clap(long, action, default_values_t = vec!["warn".to_string()])]
    pub log_level: Vec<String>,

    ///
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

///
#[non_exhaustive]
#[derive(clap::Subcommand)]
#[cfg_attr(test, derive(Debug, PartialEq, Eq))]
pub enum Commands {
    /// Ask the backstop server whether it accepts the recipients
    Verify {
        /// Recipients to verify
        #[clap(value_parser, required = true)]
        recipients: Vec<String>,
        /// Address of the client submitting the message
        #[clap(long, action, default_value = "127.0.0.1")]
        client_ip: String,
        /// The recipients are raw `RCPT TO:` command lines
        #[clap(long, action)]
        raw: bool,
    },
    /// Print the settings loaded from the store
    ConfigShow,
    /// Request a rebuild of the connection on the next verification
    Refresh,
}
