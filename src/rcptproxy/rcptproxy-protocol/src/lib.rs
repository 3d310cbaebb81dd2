//! rcptproxy protocol
//!
//! Client side of the SMTP dialogue with the backstop server:
//!
//! * [`transport::Transport`], a deadline bounded TCP client feeding a
//!   [`transport::ResponseAssembler`],
//! * [`Response`], assembling the (multi-line) replies of the server,
//! * [`SmtpConnection`], the handshake, the liveness probe and the teardown
//!   of one connection, watched over by an idle/lifetime supervisor task.

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

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
//
#![allow(clippy::module_name_repetitions)]

mod connection;
mod error;
mod response;
mod supervisor;
pub mod transport;

pub use connection::{Session, SmtpConnection};
pub use error::{Error, Stage};
pub use response::Response;
