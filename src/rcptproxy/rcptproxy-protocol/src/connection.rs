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
use crate::{transport::Transport, Error, Response, Stage};
use rcptproxy_common::Timer;
use rcptproxy_config::ConfigurationSnapshot;

const FAREWELL: &[u8] = b"QUIT\r\n";
const PROBE: &str = "RSET\r\n";

/// State guarded by the I/O lock of the connection.
#[derive(Debug)]
struct Io {
    transport: Transport,
    response: Response,
    request_timer: Timer,
    request_delay: std::time::Duration,
    /// A command has been sent and its reply is not fully read yet.
    pending: bool,
}

impl Io {
    async fn read_response(&mut self, deadline: tokio::time::Instant) -> Result<u16, Error> {
        self.response.clear();
        self.transport.receive(&mut self.response, deadline).await?;
        self.response.status().ok_or(Error::Incomplete)
    }

    async fn round_trip(&mut self, command: &str) -> Result<u16, Error> {
        self.request_timer.reset();
        let deadline = self.request_timer.deadline(self.request_delay);

        self.transport.send(command.as_bytes(), deadline).await?;
        self.read_response(deadline).await
    }

    async fn send(&mut self, command: &str) -> Result<(), Error> {
        self.request_timer.reset();
        let deadline = self.request_timer.deadline(self.request_delay);

        Ok(self.transport.send(command.as_bytes(), deadline).await?)
    }

    async fn handshake(&mut self, configuration: &ConfigurationSnapshot) -> Result<(), Error> {
        self.request_timer.reset();
        let deadline = self.request_timer.deadline(self.request_delay);

        self.transport.connect(configuration.server, deadline).await?;

        let status = self.read_response(deadline).await?;
        if status >= 300 {
            return Err(Error::NotReady {
                stage: Stage::Greeting,
                status,
            });
        }

        let status = self
            .round_trip(&format!("HELO {}\r\n", configuration.helo))
            .await?;
        if status >= 300 {
            return Err(Error::NotReady {
                stage: Stage::Helo,
                status,
            });
        }

        Ok(())
    }
}

/// One SMTP dialogue with the backstop server.
///
/// The connection is usable while it is up. Once disconnected, by an error,
/// an explicit call or the supervisor, it is never revived: build a new one.
#[derive(Debug)]
pub struct SmtpConnection {
    configuration: std::sync::Arc<ConfigurationSnapshot>,
    io: tokio::sync::Mutex<Io>,
    alive: std::sync::atomic::AtomicBool,
    activity: std::sync::Arc<tokio::sync::Notify>,
    connection_timer: Timer,
    supervisor: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// Exclusive access to the connection, held across several commands.
///
/// Dropping a session while a command is in flight marks the connection as
/// down: the dialogue is out of sync.
pub struct Session<'a> {
    connection: &'a SmtpConnection,
    io: tokio::sync::MutexGuard<'a, Io>,
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("server", &self.connection.configuration.server)
            .field("pending", &self.io.pending)
            .finish()
    }
}

impl Session<'_> {
    /// Send `command` and read the reply, returns its status.
    ///
    /// # Errors
    ///
    /// * [`Error::Disconnected`] if the connection is down
    /// * any I/O or protocol error, the connection is then disconnected
    pub async fn send_recv(&mut self, command: &str) -> Result<u16, Error> {
        if !self.connection.is_up() {
            return Err(Error::Disconnected);
        }

        self.io.pending = true;
        let result = self.io.round_trip(command).await;
        self.io.pending = false;

        match result {
            Ok(status) => {
                tracing::trace!(status, "reply");
                self.connection.activity.notify_one();
                Ok(status)
            }
            Err(error) => {
                tracing::debug!(%error, "dialogue failed");
                self.disconnect().await;
                Err(error)
            }
        }
    }

    /// Send `command` without waiting for a reply.
    ///
    /// # Errors
    ///
    /// * [`Error::Disconnected`] if the connection is down
    /// * any I/O error, the connection is then disconnected
    pub async fn send(&mut self, command: &str) -> Result<(), Error> {
        if !self.connection.is_up() {
            return Err(Error::Disconnected);
        }

        match self.io.send(command).await {
            Ok(()) => {
                self.connection.activity.notify_one();
                Ok(())
            }
            Err(error) => {
                tracing::debug!(%error, "dialogue failed");
                self.disconnect().await;
                Err(error)
            }
        }
    }

    /// Mark the connection as down and close the transport.
    pub async fn disconnect(&mut self) {
        self.connection.mark_down();
        self.io.transport.disconnect().await;
    }

    /// Restart the request timer, bounding the next round trips with `limit`.
    pub fn reset_timer(&mut self, limit: std::time::Duration) {
        self.io.request_delay = limit;
        self.io.request_timer.reset();
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.io.pending {
            tracing::debug!("session dropped during a command, connection is out of sync");
            self.connection.mark_down();
        }
    }
}

impl SmtpConnection {
    /// Connect to the backstop server of `configuration`, wait for its
    /// greeting, say `HELO` and start the idle/lifetime supervisor.
    ///
    /// # Errors
    ///
    /// * the server cannot be reached in time
    /// * [`Error::NotReady`] if the greeting or `HELO` is refused
    /// * the replies are malformed
    pub async fn connect(
        configuration: std::sync::Arc<ConfigurationSnapshot>,
    ) -> Result<std::sync::Arc<Self>, Error> {
        let mut io = Io {
            transport: Transport::new(Some(FAREWELL)),
            response: Response::new(),
            request_timer: Timer::start(),
            request_delay: configuration.request_delay,
            pending: false,
        };

        if let Err(error) = io.handshake(&configuration).await {
            tracing::debug!(server = %configuration.server, %error, "handshake failed");
            io.transport.disconnect().await;
            return Err(error);
        }

        let connection = std::sync::Arc::new(Self {
            configuration,
            io: tokio::sync::Mutex::new(io),
            alive: std::sync::atomic::AtomicBool::new(true),
            activity: std::sync::Arc::new(tokio::sync::Notify::new()),
            connection_timer: Timer::start(),
            supervisor: std::sync::Mutex::new(None),
        });

        let supervisor = tokio::spawn(crate::supervisor::run(
            std::sync::Arc::downgrade(&connection),
            connection.activity.clone(),
        ));
        *connection
            .supervisor
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(supervisor);

        tracing::debug!(server = %connection.configuration.server, "connection ready");
        Ok(connection)
    }

    /// Take the I/O lock of the connection.
    pub async fn session(&self) -> Session<'_> {
        Session {
            connection: self,
            io: self.io.lock().await,
        }
    }

    /// Send `command` and read the reply, see [`Session::send_recv`].
    ///
    /// # Errors
    ///
    /// See [`Session::send_recv`].
    pub async fn send_recv(&self, command: &str) -> Result<u16, Error> {
        self.session().await.send_recv(command).await
    }

    /// Send `command` without waiting for a reply, see [`Session::send`].
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub async fn send(&self, command: &str) -> Result<(), Error> {
        self.session().await.send(command).await
    }

    /// Is the connection still usable with `expected` ?
    ///
    /// Probes the server with `RSET`, a refusal disconnects.
    pub async fn is_alive(&self, expected: &ConfigurationSnapshot) -> bool {
        let mut session = self.session().await;

        if !self.is_up() || !session.io.transport.is_alive(expected.server) {
            return false;
        }

        match session.send_recv(PROBE).await {
            Ok(status) if status < 300 => true,
            Ok(status) => {
                tracing::debug!(status, "probe refused");
                session.disconnect().await;
                false
            }
            Err(error) => {
                tracing::debug!(%error, "probe failed");
                false
            }
        }
    }

    /// Mark the connection as down and close the transport gracefully.
    pub async fn disconnect(&self) {
        self.mark_down();
        self.io.lock().await.transport.disconnect().await;
    }

    /// Disconnect and wait for the supervisor to terminate.
    pub async fn shutdown(&self) {
        self.disconnect().await;

        let supervisor = self
            .supervisor
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(supervisor) = supervisor {
            if let Err(error) = supervisor.await {
                tracing::warn!(%error, "supervisor terminated abnormally");
            }
        }
    }

    /// Restart the request timer, bounding the next round trips with `limit`.
    pub async fn reset_timer(&self, limit: std::time::Duration) {
        self.session().await.reset_timer(limit);
    }

    /// Is the connection usable ?
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.alive.load(std::sync::atomic::Ordering::Acquire)
    }

    /// Configuration the connection has been built from.
    #[must_use]
    pub const fn configuration(&self) -> &std::sync::Arc<ConfigurationSnapshot> {
        &self.configuration
    }

    /// Age of the connection.
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.connection_timer.elapsed()
    }

    /// Delay before the supervisor has to check the connection again.
    pub(crate) fn next_check(&self) -> std::time::Duration {
        std::cmp::min(
            self.configuration.idle_timeout,
            self.connection_timer
                .remaining(self.configuration.max_lifetime),
        )
    }

    fn mark_down(&self) {
        if self
            .alive
            .swap(false, std::sync::atomic::Ordering::AcqRel)
        {
            self.activity.notify_one();
        }
    }
}

impl Drop for SmtpConnection {
    fn drop(&mut self) {
        if let Some(supervisor) = self
            .supervisor
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            supervisor.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SmtpConnection;
    use crate::{Error, Stage};
    use rcptproxy_test::{config::local_test, MockServer};
    use std::sync::Arc;

    #[test_log::test(tokio::test)]
    async fn handshake() {
        let server = MockServer::builder().start().await;

        let connection = SmtpConnection::connect(Arc::new(local_test(server.address())))
            .await
            .unwrap();

        assert!(connection.is_up());
        pretty_assertions::assert_eq!(server.received(), ["HELO rcptproxy.test\r\n"]);
        pretty_assertions::assert_eq!(server.connections(), 1);

        connection.shutdown().await;
        assert!(!connection.is_up());
        pretty_assertions::assert_eq!(
            server.received(),
            ["HELO rcptproxy.test\r\n", "QUIT\r\n"]
        );
    }

    #[rstest::rstest]
    #[case::greeting("554 go away\r\n", "250 OK\r\n", Stage::Greeting, 554)]
    #[case::helo("220 ready\r\n", "501 who are you\r\n", Stage::Helo, 501)]
    #[tokio::test]
    async fn handshake_refused(
        #[case] greeting: &str,
        #[case] helo: &str,
        #[case] expected_stage: Stage,
        #[case] expected_status: u16,
    ) {
        let server = MockServer::builder()
            .greeting(greeting)
            .reply("HELO", helo)
            .start()
            .await;

        let error = SmtpConnection::connect(Arc::new(local_test(server.address())))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            Error::NotReady { stage, status } if stage == expected_stage && status == expected_status
        ));
    }

    #[tokio::test]
    async fn malformed_greeting() {
        let server = MockServer::builder().greeting("hello\r\n").start().await;

        let error = SmtpConnection::connect(Arc::new(local_test(server.address())))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn send_recv() {
        let server = MockServer::builder()
            .reply("MAIL", "250-first\r\n250 OK\r\n")
            .reply("RCPT", "550 No such user\r\n")
            .start()
            .await;
        let connection = SmtpConnection::connect(Arc::new(local_test(server.address())))
            .await
            .unwrap();

        let mut session = connection.session().await;
        pretty_assertions::assert_eq!(
            session.send_recv("MAIL FROM:<a@b.c>\r\n").await.unwrap(),
            250
        );
        pretty_assertions::assert_eq!(
            session.send_recv("RCPT TO:<d@e.f>\r\n").await.unwrap(),
            550
        );
        drop(session);

        assert!(connection.is_up());
        connection.shutdown().await;
    }

    #[tokio::test]
    async fn timeout_disconnects() {
        let server = MockServer::builder().silent("RCPT").start().await;
        let connection = SmtpConnection::connect(Arc::new(local_test(server.address())))
            .await
            .unwrap();
        connection
            .reset_timer(std::time::Duration::from_millis(100))
            .await;

        let error = connection.send_recv("RCPT TO:<d@e.f>\r\n").await.unwrap_err();

        assert!(matches!(error, Error::Transport(_)));
        assert!(!connection.is_up());
        assert!(matches!(
            connection.send_recv("RSET\r\n").await,
            Err(Error::Disconnected)
        ));
    }

    #[tokio::test]
    async fn cancelled_session_marks_down() {
        let server = MockServer::builder().silent("RCPT").start().await;
        let connection = SmtpConnection::connect(Arc::new(local_test(server.address())))
            .await
            .unwrap();

        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            connection.send_recv("RCPT TO:<d@e.f>\r\n"),
        )
        .await;

        assert!(cancelled.is_err());
        assert!(!connection.is_up());
        connection.shutdown().await;
    }

    #[rstest::rstest]
    #[case::accepted("250 OK\r\n", true)]
    #[case::refused("421 closing\r\n", false)]
    #[case::boundary("300 odd\r\n", false)]
    #[tokio::test]
    async fn probe(#[case] reply: &str, #[case] expected: bool) {
        let server = MockServer::builder().reply("RSET", reply).start().await;
        let configuration = Arc::new(local_test(server.address()));
        let connection = SmtpConnection::connect(configuration.clone())
            .await
            .unwrap();

        pretty_assertions::assert_eq!(connection.is_alive(&configuration).await, expected);
        pretty_assertions::assert_eq!(connection.is_up(), expected);
        connection.shutdown().await;
    }

    #[tokio::test]
    async fn probe_other_server() {
        let server = MockServer::builder().start().await;
        let connection = SmtpConnection::connect(Arc::new(local_test(server.address())))
            .await
            .unwrap();

        let other = local_test("127.0.0.1:1".parse().unwrap());
        assert!(!connection.is_alive(&other).await);
        assert!(!server.received().contains(&"RSET\r\n".to_string()));
        connection.shutdown().await;
    }
}
