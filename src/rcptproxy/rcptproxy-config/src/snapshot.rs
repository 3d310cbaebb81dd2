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
use crate::{Error, ExclusionSet, Key, Store, Value};
use rcptproxy_common::parse_ipv4;

/// Strings of the store are at most this long, longer ones are ignored.
const MAX_STRING: usize = 80;

/// Trailing character of the deny template asking for the recipient to be appended.
const RECIPIENT_MARKER: char = '@';

/// How much of the store a snapshot reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Granularity {
    /// Only the server address, the port and the refresh flag were read.
    Minimal,
    /// Every setting was read.
    Complete,
}

/// Immutable view of the settings at one point in time.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConfigurationSnapshot {
    /// How much of the store was read.
    pub granularity: Granularity,
    /// The operator requested a rebuild of the connection.
    pub refresh: bool,
    /// The backstop server.
    pub server: std::net::SocketAddrV4,
    /// Identity sent with `HELO`.
    pub helo: String,
    /// Reverse path sent with `MAIL FROM`.
    pub from: String,
    /// Inactivity delay before the connection is closed.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: std::time::Duration,
    /// Maximum age of the connection.
    #[serde(with = "humantime_serde")]
    pub max_lifetime: std::time::Duration,
    /// Bound of one request round trip.
    #[serde(with = "humantime_serde")]
    pub request_delay: std::time::Duration,
    /// Drop the client session on deny.
    pub force_disconnect: bool,
    /// Status of the deny response.
    pub deny_status: u16,
    /// Text of the deny response, without the recipient marker.
    pub deny_message: String,
    /// Append the rejected recipient to [`Self::deny_message`].
    pub append_recipient: bool,
    /// Client addresses exempted from verification, shared by every snapshot.
    pub exclusions: std::sync::Arc<ExclusionSet>,
}

impl ConfigurationSnapshot {
    /// Complete snapshot holding the default value of every setting.
    #[must_use]
    pub fn new(server: std::net::SocketAddrV4, exclusions: std::sync::Arc<ExclusionSet>) -> Self {
        let mut deny_message = Self::default_deny_template();
        let append_recipient = deny_message.ends_with(RECIPIENT_MARKER);
        if append_recipient {
            deny_message.pop();
        }

        Self {
            granularity: Granularity::Complete,
            refresh: Self::default_refresh(),
            server,
            helo: Self::default_helo(),
            from: Self::default_from(),
            idle_timeout: Self::default_idle_timeout(),
            max_lifetime: Self::default_max_lifetime(),
            request_delay: Self::default_request_delay(),
            force_disconnect: Self::default_force_disconnect(),
            deny_status: Self::default_deny_status(),
            deny_message,
            append_recipient,
            exclusions,
        }
    }

    /// Read the server address, the port and the refresh flag.
    ///
    /// Every other field holds its default value.
    ///
    /// # Errors
    ///
    /// * the server address is missing, invalid or cannot be read
    pub async fn load_minimal<S: Store + ?Sized>(
        store: &S,
        exclusions: &std::sync::Arc<ExclusionSet>,
    ) -> Result<Self, Error> {
        let server = read_server(store).await?;
        let refresh = read_boolean(store, Key::Refresh)
            .await
            .unwrap_or_else(Self::default_refresh);

        Ok(Self {
            granularity: Granularity::Minimal,
            refresh,
            ..Self::new(server, exclusions.clone())
        })
    }

    /// Read every setting and rebuild `exclusions`, without acknowledging
    /// the refresh request.
    ///
    /// # Errors
    ///
    /// * the server address is missing, invalid or cannot be read
    pub async fn read_complete<S: Store + ?Sized>(
        store: &S,
        exclusions: &std::sync::Arc<ExclusionSet>,
    ) -> Result<Self, Error> {
        let server = read_server(store).await?;

        let mut deny_message = read_string(store, Key::DenyMessage)
            .await
            .unwrap_or_else(Self::default_deny_template);
        let append_recipient = deny_message.ends_with(RECIPIENT_MARKER);
        if append_recipient {
            deny_message.pop();
        }

        let entries = match read_optional(store, Key::Exclusions).await {
            Some(Value::List(entries)) => entries,
            Some(Value::String(entry)) => vec![entry],
            Some(other) => mistyped(Key::Exclusions, &other).unwrap_or_default(),
            None => vec![],
        };
        exclusions.rebuild(entries);

        Ok(Self {
            granularity: Granularity::Complete,
            refresh: read_boolean(store, Key::Refresh)
                .await
                .unwrap_or_else(Self::default_refresh),
            server,
            helo: read_string(store, Key::ProtocolHelo)
                .await
                .unwrap_or_else(Self::default_helo),
            from: read_string(store, Key::ProtocolFrom)
                .await
                .unwrap_or_else(Self::default_from),
            idle_timeout: read_integer(store, Key::IdleTimeout)
                .await
                .map_or_else(Self::default_idle_timeout, |secs| {
                    std::time::Duration::from_secs(u64::from(secs))
                }),
            max_lifetime: read_integer(store, Key::MaxLifetime)
                .await
                .map_or_else(Self::default_max_lifetime, |secs| {
                    std::time::Duration::from_secs(u64::from(secs))
                }),
            request_delay: read_integer(store, Key::RequestDelay)
                .await
                .map_or_else(Self::default_request_delay, |millis| {
                    std::time::Duration::from_millis(u64::from(millis))
                }),
            force_disconnect: read_boolean(store, Key::ForceDisconnect)
                .await
                .unwrap_or_else(Self::default_force_disconnect),
            deny_status: read_integer(store, Key::DenyStatus)
                .await
                .and_then(|status| u16::try_from(status).ok())
                .unwrap_or_else(Self::default_deny_status),
            deny_message,
            append_recipient,
            exclusions: exclusions.clone(),
        })
    }

    /// Read every setting, rebuild `exclusions` and acknowledge the refresh
    /// request by writing the flag back to `false`.
    ///
    /// A failure to write the acknowledgement is logged, the snapshot is
    /// still returned.
    ///
    /// # Errors
    ///
    /// * the server address is missing, invalid or cannot be read
    pub async fn load_complete<S: Store + ?Sized>(
        store: &S,
        exclusions: &std::sync::Arc<ExclusionSet>,
    ) -> Result<Self, Error> {
        let snapshot = Self::read_complete(store, exclusions).await?;

        if let Err(error) = store.write(Key::Refresh, Value::Boolean(false)).await {
            tracing::warn!(%error, "cannot acknowledge the refresh request");
        }

        Ok(snapshot)
    }

    /// Response handed to the client when `recipient` is denied, CRLF terminated.
    #[must_use]
    pub fn deny_response(&self, recipient: &str) -> String {
        format!(
            "{:03} {}{}\r\n",
            self.deny_status % 1000,
            self.deny_message,
            if self.append_recipient { recipient } else { "" }
        )
    }
}

async fn read_server<S: Store + ?Sized>(store: &S) -> Result<std::net::SocketAddrV4, Error> {
    let key = Key::ServerAddress;
    let address = match store.read(key).await {
        Ok(Some(Value::String(value))) => match parse_ipv4(&value) {
            Some(address) if value.len() < MAX_STRING => address,
            _ => return Err(Error::Invalid { key, value }),
        },
        Ok(Some(other)) => {
            return Err(Error::Invalid {
                key,
                value: format!("{other:?}"),
            })
        }
        Ok(None) => return Err(Error::Missing { key }),
        Err(source) => return Err(Error::Store { key, source }),
    };

    let port = read_integer(store, Key::ServerPort)
        .await
        .and_then(|port| u16::try_from(port).ok())
        .filter(|port| *port != 0)
        .unwrap_or_else(ConfigurationSnapshot::default_port);

    Ok(std::net::SocketAddrV4::new(address, port))
}

async fn read_optional<S: Store + ?Sized>(store: &S, key: Key) -> Option<Value> {
    match store.read(key).await {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%key, %error, "cannot read setting, using default");
            None
        }
    }
}

fn mistyped<T>(key: Key, value: &Value) -> Option<T> {
    tracing::warn!(%key, ?value, "setting has an unexpected type, using default");
    None
}

async fn read_boolean<S: Store + ?Sized>(store: &S, key: Key) -> Option<bool> {
    match read_optional(store, key).await? {
        Value::Boolean(value) => Some(value),
        Value::Integer(value) => Some(value != 0),
        other => mistyped(key, &other),
    }
}

async fn read_integer<S: Store + ?Sized>(store: &S, key: Key) -> Option<u32> {
    match read_optional(store, key).await? {
        Value::Integer(value) => Some(value),
        other => mistyped(key, &other),
    }
}

async fn read_string<S: Store + ?Sized>(store: &S, key: Key) -> Option<String> {
    match read_optional(store, key).await? {
        Value::String(value) if value.len() < MAX_STRING => Some(value),
        other => mistyped(key, &other),
    }
}
