//! rcptproxy callout
//!
//! Before accepting a message for a recipient, ask the backstop SMTP server
//! whether it would accept that recipient, and deny the command if not.
//!
//! ```no_run
//! # async fn run() {
//! let store = rcptproxy_config::MemoryStore::new();
//! let verifier = rcptproxy_callout::Verifier::new(store);
//!
//! match verifier.verify("<john@doe.com>", Some("192.168.1.7")).await {
//!     rcptproxy_callout::Outcome::Denied(denial) => print!("{}", denial.response),
//!     outcome => println!("{outcome}"),
//! }
//! verifier.shutdown().await;
//! # }
//! ```

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

mod cache;
mod error;
mod outcome;
mod request;
mod verifier;

pub use cache::ConnectionCache;
pub use error::Error;
pub use outcome::{Denial, DenyAction, Outcome};
pub use request::{VerificationRequest, Verdict};
pub use verifier::Verifier;
