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
use crate::{ConnectionCache, Denial, Error, Outcome, Verdict, VerificationRequest};
use rcptproxy_common::{parse_ipv4, parse_rcpt_command, parse_recipient, InputError};
use rcptproxy_config::Store;

/// Entry point of the host integration.
///
/// Owns the backing store of the settings and the connection cache. Can be
/// shared by concurrent sessions.
#[derive(Debug)]
pub struct Verifier<S: Store> {
    store: S,
    cache: ConnectionCache,
}

impl<S: Store> Verifier<S> {
    /// Create a verifier reading its settings from `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: ConnectionCache::new(),
        }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The connection cache.
    #[must_use]
    pub const fn cache(&self) -> &ConnectionCache {
        &self.cache
    }

    /// Verify `recipient` for a session opened by `client`.
    ///
    /// `client` is `None` when the message does not come from a remote
    /// client, such a message is never verified. Errors are logged and
    /// translated: malformed input is not applicable, every other failure
    /// means the verification was not performed.
    pub async fn verify(&self, recipient: &str, client: Option<&str>) -> Outcome {
        Self::translate(self.try_verify(recipient, client).await)
    }

    /// Same as [`Verifier::verify`] for a raw `RCPT TO:` command line.
    pub async fn verify_command(&self, command: &str, client: Option<&str>) -> Outcome {
        let result = match parse_rcpt_command(command) {
            Ok(recipient) => self.try_verify(&recipient, client).await,
            Err(error) => Err(error.into()),
        };
        Self::translate(result)
    }

    /// Verify `recipient` for a session opened by `client`.
    ///
    /// # Errors
    ///
    /// * [`Error::Input`] if `client` or `recipient` is malformed
    /// * [`Error::Config`] if the settings cannot be loaded
    /// * [`Error::Transport`] or [`Error::Protocol`] if the dialogue failed
    #[tracing::instrument(name = "verify", skip(self), ret, err)]
    pub async fn try_verify(&self, recipient: &str, client: Option<&str>) -> Result<Outcome, Error> {
        let Some(client) = client else {
            return Ok(Outcome::NotApplicable);
        };
        let client = parse_ipv4(client)
            .ok_or_else(|| InputError::InvalidClientAddress(client.to_string()))?;
        let recipient = parse_recipient(recipient)?;

        let connection = self.cache.acquire(&self.store).await?;

        if self.cache.exclusions().is_excluded(client) {
            tracing::debug!(%client, "client is excluded");
            return Ok(Outcome::NotApplicable);
        }

        let configuration = connection.configuration();
        let verdict = VerificationRequest::new(configuration, &connection)
            .execute(&recipient)
            .await?;

        Ok(match verdict {
            Verdict::NotPerformed => Outcome::NotPerformed,
            Verdict::Allowed => Outcome::Allowed,
            Verdict::Denied => Outcome::Denied(Denial::new(configuration, &recipient)),
        })
    }

    /// Release the connection to the backstop server.
    pub async fn shutdown(&self) {
        self.cache.release().await;
    }

    fn translate(result: Result<Outcome, Error>) -> Outcome {
        match result {
            Ok(outcome) => outcome,
            Err(Error::Input(error)) => {
                tracing::warn!(%error, "verification not applicable");
                Outcome::NotApplicable
            }
            Err(error) => {
                tracing::warn!(%error, "verification not performed");
                Outcome::NotPerformed
            }
        }
    }
}
