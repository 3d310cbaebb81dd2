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

/// Identifiers of the settings in the backing store.
///
/// Each key keeps the numeric identifier used by the historical store,
/// see [`Key::id`]. The textual form (snake case) is the one used by the
/// file backed store.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Key {
    /// Dotted-quad address of the backstop server. Required.
    ServerAddress,
    /// Set by the operator to request a rebuild of the connection, cleared by the engine.
    Refresh,
    /// Port of the backstop server.
    ServerPort,
    /// Identity sent with `HELO`.
    ProtocolHelo,
    /// Seconds of inactivity before the connection is closed.
    IdleTimeout,
    /// Maximum age of the connection, in seconds.
    MaxLifetime,
    /// Ask the host to drop the client session on deny.
    ForceDisconnect,
    /// Reverse path sent with `MAIL FROM`.
    ProtocolFrom,
    /// Maximum duration of one request round trip, in milliseconds.
    RequestDelay,
    /// Client addresses for which no verification is made.
    Exclusions,
    /// Text of the deny response. A trailing `@` appends the recipient.
    DenyMessage,
    /// Status code of the deny response.
    DenyStatus,
}

impl Key {
    /// Numeric identifier of the key in the historical store.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::ServerAddress => 0,
            Self::Refresh => 1,
            Self::ServerPort => 0x0001_0011,
            Self::ProtocolHelo => 0x0001_0012,
            Self::IdleTimeout => 0x0001_0013,
            Self::MaxLifetime => 0x0001_0014,
            Self::ForceDisconnect => 0x0001_0015,
            Self::ProtocolFrom => 0x0001_0016,
            Self::RequestDelay => 0x0001_0017,
            Self::Exclusions => 0x0001_0018,
            Self::DenyMessage => 0x0001_0019,
            Self::DenyStatus => 0x0001_001A,
        }
    }
}

/// A value of the backing store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag.
    Boolean(bool),
    /// 32-bit unsigned integer.
    Integer(u32),
    /// Short string.
    String(String),
    /// Sequence of strings, the first empty entry terminates the sequence.
    List(Vec<String>),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<const N: usize> From<[&str; N]> for Value {
    fn from(value: [&str; N]) -> Self {
        Self::List(value.iter().map(ToString::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::Key;
    use strum::IntoEnumIterator;

    #[test]
    fn textual_form() {
        for key in Key::iter() {
            pretty_assertions::assert_eq!(key.to_string().parse::<Key>(), Ok(key));
        }
        pretty_assertions::assert_eq!(Key::ServerAddress.as_ref(), "server_address");
        pretty_assertions::assert_eq!(Key::DenyStatus.to_string(), "deny_status");
        assert!("unknown".parse::<Key>().is_err());
    }

    #[test]
    fn identifiers_are_unique() {
        let mut ids = Key::iter().map(Key::id).collect::<Vec<_>>();
        ids.sort_unstable();
        ids.dedup();
        pretty_assertions::assert_eq!(ids.len(), Key::iter().count());
        pretty_assertions::assert_eq!(Key::ServerPort.id(), 65553);
        pretty_assertions::assert_eq!(Key::DenyStatus.id(), 65562);
    }
}
