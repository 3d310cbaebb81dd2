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

/// Step of the handshake with the backstop server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    /// Banner sent by the server on connection.
    Greeting,
    /// Reply to `HELO`.
    Helo,
}

/// Error of the SMTP dialogue.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying transport failed.
    #[error(transparent)]
    Transport(#[from] crate::transport::Error),
    /// A line of the reply is shorter than a status code and its separator.
    #[error("reply line is too short: {line:?}")]
    TooShort {
        /// The offending line.
        line: String,
    },
    /// A line of the reply does not start with a valid status code and separator.
    #[error("invalid reply line: {line:?}")]
    InvalidResponse {
        /// The offending line.
        line: String,
    },
    /// The reply ended before its final line.
    #[error("reply is incomplete")]
    Incomplete,
    /// The server refused the handshake.
    #[error("server is not ready, {stage} answered with status {status}")]
    NotReady {
        /// Step of the handshake.
        stage: Stage,
        /// Status returned by the server.
        status: u16,
    },
    /// The connection has been closed.
    #[error("connection to the backstop server is closed")]
    Disconnected,
}
