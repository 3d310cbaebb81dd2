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
use rcptproxy_config::ConfigurationSnapshot;
use rcptproxy_protocol::SmtpConnection;

/// Decision of the backstop server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The dialogue could not be carried out.
    NotPerformed,
    /// `RCPT TO` was accepted.
    Allowed,
    /// `RCPT TO` was refused.
    Denied,
}

/// One `MAIL FROM` / `RCPT TO` exchange on a connection.
#[derive(Debug)]
pub struct VerificationRequest<'a> {
    configuration: &'a ConfigurationSnapshot,
    connection: &'a SmtpConnection,
}

/// Enclose `path` in angle brackets unless it already starts with one.
fn bracketed(path: &str) -> std::borrow::Cow<'_, str> {
    if path.starts_with('<') {
        std::borrow::Cow::Borrowed(path)
    } else {
        std::borrow::Cow::Owned(format!("<{path}>"))
    }
}

impl<'a> VerificationRequest<'a> {
    /// Bind a request to `configuration` and `connection`.
    #[must_use]
    pub const fn new(
        configuration: &'a ConfigurationSnapshot,
        connection: &'a SmtpConnection,
    ) -> Self {
        Self {
            configuration,
            connection,
        }
    }

    /// Ask the server whether it accepts `recipient`.
    ///
    /// Both commands are issued under one lock of the connection. A refused
    /// `MAIL FROM` disconnects and yields [`Verdict::NotPerformed`].
    ///
    /// # Errors
    ///
    /// * the dialogue failed, the connection is then disconnected
    pub async fn execute(self, recipient: &str) -> Result<Verdict, rcptproxy_protocol::Error> {
        if recipient.is_empty() || self.configuration.from.is_empty() {
            return Ok(Verdict::NotPerformed);
        }

        let mut session = self.connection.session().await;

        let status = session
            .send_recv(&format!(
                "MAIL FROM:{}\r\n",
                bracketed(&self.configuration.from)
            ))
            .await?;
        if status >= 300 {
            tracing::warn!(status, from = %self.configuration.from, "reverse path refused");
            session.disconnect().await;
            return Ok(Verdict::NotPerformed);
        }

        let status = session
            .send_recv(&format!("RCPT TO:{}\r\n", bracketed(recipient)))
            .await?;
        tracing::debug!(status, recipient, "recipient checked");

        Ok(if status < 300 {
            Verdict::Allowed
        } else {
            Verdict::Denied
        })
    }
}
