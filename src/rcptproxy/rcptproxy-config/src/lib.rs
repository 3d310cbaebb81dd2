//! rcptproxy configuration
//!
//! The settings of the callout engine are not owned by the engine: they live
//! in a key/value backing store shared with the operator tooling, see [`Store`].
//!
//! They are read with two granularities:
//! * [`ConfigurationSnapshot::load_minimal`], cheap, read on every verification,
//!   only tells where the backstop server is and whether a refresh was requested,
//! * [`ConfigurationSnapshot::load_complete`], read when the connection to the
//!   backstop server has to be (re)built. It also rebuilds the [`ExclusionSet`]
//!   and acknowledges the refresh request.
//!
//! Every setting but the backstop server address is optional and has a default
//! value, see [`Key`].

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
#![allow(clippy::use_self)] // false positive

mod default;
mod error;
mod exclusion;
mod file_store;
mod key;
mod snapshot;
mod store;

pub use error::{Error, StoreError};
pub use exclusion::ExclusionSet;
pub use file_store::FileStore;
pub use key::{Key, Value};
pub use snapshot::{ConfigurationSnapshot, Granularity};
pub use store::{MemoryStore, Store};
