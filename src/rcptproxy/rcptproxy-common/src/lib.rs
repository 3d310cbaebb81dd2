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

//! rcptproxy common definition
//!
//! Building blocks shared by the callout engine: a monotonic [`Timer`],
//! the dotted-quad parser used for client and server addresses, and the
//! parsers turning what the host hands us into a recipient mailbox.

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
#![allow(clippy::missing_const_for_fn)] // see https://github.com/rust-lang/rust-clippy/issues/9271

/// Default smtp port
pub const SMTP_PORT: u16 = 25;

mod ip;
mod recipient;
mod timer;

pub use ip::parse_ipv4;
pub use recipient::{parse_rcpt_command, parse_recipient, InputError};
pub use timer::Timer;
