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

/// Failure of a verification, see [`crate::Verifier::try_verify`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The settings cannot be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] rcptproxy_config::Error),
    /// The backstop server does not speak SMTP as expected.
    #[error("protocol error: {0}")]
    Protocol(rcptproxy_protocol::Error),
    /// The backstop server cannot be reached.
    #[error("transport error: {0}")]
    Transport(rcptproxy_protocol::transport::Error),
    /// The host supplied a malformed recipient or client address.
    #[error("input error: {0}")]
    Input(#[from] rcptproxy_common::InputError),
}

impl From<rcptproxy_protocol::Error> for Error {
    fn from(error: rcptproxy_protocol::Error) -> Self {
        match error {
            rcptproxy_protocol::Error::Transport(transport) => Self::Transport(transport),
            otherwise => Self::Protocol(otherwise),
        }
    }
}
