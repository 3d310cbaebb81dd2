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
use crate::Error;
use rcptproxy_config::{ConfigurationSnapshot, ExclusionSet, Store};
use rcptproxy_protocol::SmtpConnection;

/// Holder of the single connection to the backstop server.
///
/// The connection is built lazily and rebuilt when the operator requests a
/// refresh or when it fails its liveness probe. Construction and teardown
/// are serialized by the lock of the slot: concurrent callers finding an
/// empty slot dial once.
#[derive(Debug, Default)]
pub struct ConnectionCache {
    slot: tokio::sync::Mutex<Option<std::sync::Arc<SmtpConnection>>>,
    exclusions: std::sync::Arc<ExclusionSet>,
}

impl ConnectionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Client addresses exempted from verification, rebuilt with the connection.
    #[must_use]
    pub const fn exclusions(&self) -> &std::sync::Arc<ExclusionSet> {
        &self.exclusions
    }

    /// Get a usable connection, building a new one if needed.
    ///
    /// # Errors
    ///
    /// * the settings cannot be loaded
    /// * the connection cannot be established, the cache is then left empty
    pub async fn acquire<S: Store + ?Sized>(
        &self,
        store: &S,
    ) -> Result<std::sync::Arc<SmtpConnection>, Error> {
        let minimal = ConfigurationSnapshot::load_minimal(store, &self.exclusions).await?;

        let mut slot = self.slot.lock().await;

        if let Some(connection) = slot.as_ref() {
            if !minimal.refresh && connection.is_alive(&minimal).await {
                connection
                    .reset_timer(connection.configuration().request_delay)
                    .await;
                return Ok(connection.clone());
            }
        }

        if let Some(stale) = slot.take() {
            tracing::debug!(refresh = minimal.refresh, "discarding connection");
            stale.shutdown().await;
        }

        let complete =
            ConfigurationSnapshot::load_complete(store, &self.exclusions).await?;
        let connection = SmtpConnection::connect(std::sync::Arc::new(complete)).await?;

        tracing::info!(
            server = %connection.configuration().server,
            exclusions = self.exclusions.len(),
            "connected to backstop server"
        );
        *slot = Some(connection.clone());

        Ok(connection)
    }

    /// Disconnect the cached connection, the next [`ConnectionCache::acquire`] rebuilds it.
    pub async fn invalidate(&self) {
        if let Some(connection) = self.slot.lock().await.as_ref() {
            connection.disconnect().await;
        }
    }

    /// Shut the cached connection down and empty the cache.
    pub async fn release(&self) {
        let connection = self.slot.lock().await.take();
        if let Some(connection) = connection {
            connection.shutdown().await;
            tracing::debug!("connection released");
        }
    }

    /// Is a connection cached ?
    pub async fn is_empty(&self) -> bool {
        self.slot.lock().await.is_none()
    }
}
