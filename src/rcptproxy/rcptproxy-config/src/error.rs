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
use crate::Key;

/// Failure of the backing store itself.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The file of the store cannot be read or written.
    #[error("cannot access the store at '{path}': {source}")]
    Io {
        /// Location of the store.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The content of the store is not valid.
    #[error("store format error: {0}")]
    Deserialize(#[from] toml::de::Error),
    /// The content of the store cannot be rendered.
    #[error("store format error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The store contains a key the engine does not know.
    #[error("unknown key '{0}' in store")]
    UnknownKey(String),
    /// A thread panicked while holding the lock of the store.
    #[error("store lock is poisoned")]
    Poisoned,
}

/// Error while producing a configuration snapshot.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A required setting is absent from the store.
    #[error("required setting '{key}' is missing")]
    Missing {
        /// The setting.
        key: Key,
    },
    /// A required setting cannot be parsed.
    #[error("setting '{key}' has an invalid value: {value}")]
    Invalid {
        /// The setting.
        key: Key,
        /// Value found in the store.
        value: String,
    },
    /// The store failed while reading a required setting.
    #[error("cannot read setting '{key}': {source}")]
    Store {
        /// The setting.
        key: Key,
        /// Underlying error.
        #[source]
        source: StoreError,
    },
}
