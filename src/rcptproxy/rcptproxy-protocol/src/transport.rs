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
//! Deadline bounded TCP client.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Size of the receive buffer.
const BUFFER_SIZE: usize = 2000;

/// Default bound of each step of the graceful close.
pub const CLOSE_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);

/// I/O step bounded by a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    /// Establishing the connection.
    Connecting,
    /// Writing to the peer.
    Sending,
    /// Reading from the peer.
    Receiving,
}

/// Error of the transport.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The connection cannot be established.
    #[error("cannot connect to '{target}': {source}")]
    Connect {
        /// Remote address.
        target: std::net::SocketAddrV4,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The deadline elapsed before the step completed.
    #[error("deadline elapsed while {operation}")]
    Timeout {
        /// The step that timed out.
        operation: Operation,
    },
    /// Other IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    ConnectionClosed,
    /// The transport is not connected.
    #[error("transport is not connected")]
    NotConnected,
}

/// Progress reported by a [`ResponseAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembly {
    /// More data is needed.
    Partial,
    /// The response is complete, reception stops.
    Complete,
}

/// Protocol specific assembly of the bytes received into a response.
pub trait ResponseAssembler {
    /// Error raised on malformed data.
    type Error;

    /// Consume a chunk of received data.
    ///
    /// # Errors
    ///
    /// * the data does not follow the protocol
    fn on_receive(&mut self, data: &[u8]) -> Result<Assembly, Self::Error>;
}

/// TCP client where every step is bounded by a deadline.
#[derive(Debug)]
pub struct Transport {
    stream: Option<tokio::net::TcpStream>,
    target: Option<std::net::SocketAddrV4>,
    buffer: Box<[u8]>,
    farewell: Option<&'static [u8]>,
    close_timeout: std::time::Duration,
}

async fn within<F: std::future::Future>(
    operation: Operation,
    deadline: tokio::time::Instant,
    future: F,
) -> Result<F::Output, Error> {
    if tokio::time::Instant::now() >= deadline {
        return Err(Error::Timeout { operation });
    }
    tokio::time::timeout_at(deadline, future)
        .await
        .map_err(|_elapsed| Error::Timeout { operation })
}

impl Transport {
    /// Create a disconnected transport. `farewell` is written to the peer
    /// when disconnecting.
    #[must_use]
    pub fn new(farewell: Option<&'static [u8]>) -> Self {
        Self {
            stream: None,
            target: None,
            buffer: vec![0; BUFFER_SIZE].into_boxed_slice(),
            farewell,
            close_timeout: CLOSE_TIMEOUT,
        }
    }

    /// Change the bound of each step of the graceful close.
    #[must_use]
    pub const fn with_close_timeout(mut self, close_timeout: std::time::Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    /// Connect to `target`, closing the previous connection if any.
    ///
    /// # Errors
    ///
    /// * [`Error::Timeout`] if `deadline` elapsed
    /// * [`Error::Connect`] if the peer cannot be reached
    pub async fn connect(
        &mut self,
        target: std::net::SocketAddrV4,
        deadline: tokio::time::Instant,
    ) -> Result<(), Error> {
        self.disconnect().await;

        let stream = within(
            Operation::Connecting,
            deadline,
            tokio::net::TcpStream::connect(target),
        )
        .await?
        .map_err(|source| Error::Connect { target, source })?;

        if let Err(error) = stream.set_nodelay(true) {
            tracing::debug!(%error, "cannot disable Nagle's algorithm");
        }

        tracing::debug!(peer = %target, "connected");
        self.stream = Some(stream);
        self.target = Some(target);
        Ok(())
    }

    /// Write the whole `data` to the peer.
    ///
    /// # Errors
    ///
    /// * [`Error::NotConnected`]
    /// * [`Error::Timeout`] if `deadline` elapsed
    /// * [`Error::Io`] produced by the socket
    pub async fn send(
        &mut self,
        data: &[u8],
        deadline: tokio::time::Instant,
    ) -> Result<(), Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(">> {:?}", String::from_utf8_lossy(data));
        within(Operation::Sending, deadline, stream.write_all(data)).await??;
        Ok(())
    }

    /// Read from the peer and hand the chunks to `assembler` until it reports
    /// a complete response.
    ///
    /// # Errors
    ///
    /// * [`Error::NotConnected`]
    /// * [`Error::Timeout`] if `deadline` elapsed
    /// * [`Error::ConnectionClosed`] if the peer closed the connection
    /// * [`Error::Io`] produced by the socket
    /// * the error of the assembler
    pub async fn receive<A>(
        &mut self,
        assembler: &mut A,
        deadline: tokio::time::Instant,
    ) -> Result<(), A::Error>
    where
        A: ResponseAssembler + Send,
        A::Error: From<Error>,
    {
        loop {
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

            let read = within(Operation::Receiving, deadline, stream.read(&mut self.buffer))
                .await?
                .map_err(Error::from)?;
            if read == 0 {
                return Err(Error::ConnectionClosed.into());
            }

            let chunk = &self.buffer[..read];
            tracing::trace!("<< {:?}", String::from_utf8_lossy(chunk));

            if assembler.on_receive(chunk)? == Assembly::Complete {
                return Ok(());
            }
        }
    }

    /// Close the connection gracefully: write the farewell, half-close and
    /// drain what the peer still sends, each step bounded by the close
    /// timeout. Never fails, does nothing if not connected.
    pub async fn disconnect(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        if let Some(farewell) = self.farewell {
            tracing::trace!(">> {:?}", String::from_utf8_lossy(farewell));
            let deadline = tokio::time::Instant::now() + self.close_timeout;
            match within(Operation::Sending, deadline, stream.write_all(farewell)).await {
                Ok(Ok(())) => (),
                Ok(Err(error)) => tracing::debug!(%error, "farewell not sent"),
                Err(error) => tracing::debug!(%error, "farewell not sent"),
            }
        }

        let deadline = tokio::time::Instant::now() + self.close_timeout;
        if let Ok(Err(error)) = within(Operation::Sending, deadline, stream.shutdown()).await {
            tracing::debug!(%error, "half-close failed");
        }

        let deadline = tokio::time::Instant::now() + self.close_timeout;
        loop {
            match within(Operation::Receiving, deadline, stream.read(&mut self.buffer)).await {
                Ok(Ok(0) | Err(_)) | Err(_) => break,
                Ok(Ok(read)) => {
                    tracing::trace!("<< {:?}", String::from_utf8_lossy(&self.buffer[..read]));
                }
            }
        }

        tracing::debug!(peer = ?self.target, "disconnected");
    }

    /// Is the transport connected ?
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Is the transport connected to `expected` ?
    #[must_use]
    pub fn is_alive(&self, expected: std::net::SocketAddrV4) -> bool {
        self.is_connected() && self.target == Some(expected)
    }

    /// Address of the last peer.
    #[must_use]
    pub const fn target(&self) -> Option<std::net::SocketAddrV4> {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::{Assembly, Error, Operation, ResponseAssembler, Transport};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Complete after `expected` bytes.
    struct Counter {
        expected: usize,
        received: Vec<u8>,
    }

    impl ResponseAssembler for Counter {
        type Error = Error;

        fn on_receive(&mut self, data: &[u8]) -> Result<Assembly, Self::Error> {
            self.received.extend_from_slice(data);
            Ok(if self.received.len() >= self.expected {
                Assembly::Complete
            } else {
                Assembly::Partial
            })
        }
    }

    fn deadline(millis: u64) -> tokio::time::Instant {
        tokio::time::Instant::now() + std::time::Duration::from_millis(millis)
    }

    async fn listener() -> (tokio::net::TcpListener, std::net::SocketAddrV4) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let std::net::SocketAddr::V4(address) = listener.local_addr().unwrap() else {
            panic!("listener is not ipv4")
        };
        (listener, address)
    }

    #[test_log::test(tokio::test)]
    async fn send_receive_and_farewell() {
        let (listener, address) = listener().await;
        let peer = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = [0; 5];
            socket.read_exact(&mut buffer).await.unwrap();
            assert_eq!(&buffer, b"ping\n");
            socket.write_all(b"po").await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            socket.write_all(b"ng\n").await.unwrap();

            let mut rest = vec![];
            socket.read_to_end(&mut rest).await.unwrap();
            rest
        });

        let mut transport = Transport::new(Some(b"bye\n"));
        transport.connect(address, deadline(1000)).await.unwrap();
        assert!(transport.is_alive(address));

        transport.send(b"ping\n", deadline(1000)).await.unwrap();
        let mut counter = Counter {
            expected: 5,
            received: vec![],
        };
        transport.receive(&mut counter, deadline(1000)).await.unwrap();
        pretty_assertions::assert_eq!(counter.received, b"pong\n");

        transport.disconnect().await;
        assert!(!transport.is_connected());
        pretty_assertions::assert_eq!(peer.await.unwrap(), b"bye\n");

        // idempotent
        transport.disconnect().await;
    }

    #[tokio::test]
    async fn receive_timeout() {
        let (listener, address) = listener().await;
        let _peer = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            drop(socket);
        });

        let mut transport = Transport::new(None);
        transport.connect(address, deadline(1000)).await.unwrap();

        let mut counter = Counter {
            expected: 1,
            received: vec![],
        };
        let error = transport
            .receive(&mut counter, deadline(100))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Timeout {
                operation: Operation::Receiving
            }
        ));
    }

    #[tokio::test]
    async fn elapsed_deadline() {
        let (_listener, address) = listener().await;

        let mut transport = Transport::new(None);
        let error = transport
            .connect(address, tokio::time::Instant::now())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Timeout {
                operation: Operation::Connecting
            }
        ));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn peer_closed() {
        let (listener, address) = listener().await;
        let _peer = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let mut transport = Transport::new(None);
        transport.connect(address, deadline(1000)).await.unwrap();

        let mut counter = Counter {
            expected: 1,
            received: vec![],
        };
        let error = transport
            .receive(&mut counter, deadline(1000))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::ConnectionClosed | Error::Io(_)));
    }

    #[tokio::test]
    async fn connection_refused() {
        let (listener, address) = listener().await;
        drop(listener);

        let mut transport = Transport::new(None);
        let error = transport
            .connect(address, deadline(1000))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Connect { target, .. } if target == address));
    }

    #[tokio::test]
    async fn not_connected() {
        let mut transport = Transport::new(None);

        assert!(matches!(
            transport.send(b"x", deadline(1000)).await,
            Err(Error::NotConnected)
        ));
        assert!(!transport.is_alive("127.0.0.1:25".parse().unwrap()));
    }
}
