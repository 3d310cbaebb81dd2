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
use rcptproxy_config::{ConfigurationSnapshot, Key, MemoryStore, Value};

/// Identity sent with `HELO` in tests.
pub const HELO: &str = "rcptproxy.test";

/// Reverse path sent with `MAIL FROM` in tests.
pub const FROM: &str = "verify@rcptproxy.test";

/// Get a complete snapshot for a local backstop server.
#[must_use]
pub fn local_test(server: std::net::SocketAddrV4) -> ConfigurationSnapshot {
    ConfigurationSnapshot {
        helo: HELO.to_string(),
        from: FROM.to_string(),
        idle_timeout: std::time::Duration::from_secs(30),
        max_lifetime: std::time::Duration::from_secs(60),
        request_delay: std::time::Duration::from_secs(2),
        ..ConfigurationSnapshot::new(server, std::sync::Arc::default())
    }
}

/// Get a store holding the settings of [`local_test`].
#[must_use]
pub fn local_store(server: std::net::SocketAddrV4) -> MemoryStore {
    [
        (Key::ServerAddress, Value::from(server.ip().to_string())),
        (Key::ServerPort, Value::Integer(u32::from(server.port()))),
        (Key::Refresh, Value::Boolean(false)),
        (Key::ProtocolHelo, Value::from(HELO)),
        (Key::ProtocolFrom, Value::from(FROM)),
        (Key::IdleTimeout, Value::Integer(30)),
        (Key::MaxLifetime, Value::Integer(60)),
        (Key::RequestDelay, Value::Integer(2000)),
    ]
    .into_iter()
    .collect()
}
