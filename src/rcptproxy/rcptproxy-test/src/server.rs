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
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

/// What the server does when it receives a command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer {
    Reply(String),
    Silent,
    Close,
}

#[derive(Debug)]
struct Script {
    greeting: String,
    /// Per verb, answers used in order, the last one is repeated.
    answers: std::collections::HashMap<String, std::collections::VecDeque<Answer>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            greeting: "220 mock.rcptproxy.test ESMTP\r\n".to_string(),
            answers: std::collections::HashMap::new(),
        }
    }
}

impl Script {
    fn push(&mut self, verb: &str, answer: Answer) {
        self.answers
            .entry(verb.to_ascii_uppercase())
            .or_default()
            .push_back(answer);
    }

    fn replace(&mut self, verb: &str, answer: Answer) {
        self.answers
            .insert(verb.to_ascii_uppercase(), std::iter::once(answer).collect());
    }

    fn answer(&mut self, verb: &str) -> Answer {
        let scripted = match self.answers.get_mut(verb) {
            Some(answers) if answers.len() > 1 => answers.pop_front(),
            Some(answers) => answers.front().cloned(),
            None => None,
        };
        scripted.unwrap_or_else(|| match verb {
            "QUIT" => Answer::Reply("221 Bye\r\n".to_string()),
            _ => Answer::Reply("250 OK\r\n".to_string()),
        })
    }
}

#[derive(Debug, Default)]
struct State {
    script: std::sync::Mutex<Script>,
    received: std::sync::Mutex<Vec<String>>,
    connections: std::sync::atomic::AtomicUsize,
}

impl State {
    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Builder of a [`MockServer`].
#[derive(Debug, Default)]
pub struct MockServerBuilder {
    script: Script,
}

impl MockServerBuilder {
    /// Banner sent on connection, CRLF included.
    #[must_use]
    pub fn greeting(mut self, greeting: &str) -> Self {
        self.script.greeting = greeting.to_string();
        self
    }

    /// Answer `reply` to `verb`. Several replies for a verb are used in
    /// order, the last one is repeated.
    #[must_use]
    pub fn reply(mut self, verb: &str, reply: &str) -> Self {
        self.script.push(verb, Answer::Reply(reply.to_string()));
        self
    }

    /// Never answer to `verb`.
    #[must_use]
    pub fn silent(mut self, verb: &str) -> Self {
        self.script.push(verb, Answer::Silent);
        self
    }

    /// Close the connection on `verb`.
    #[must_use]
    pub fn close_on(mut self, verb: &str) -> Self {
        self.script.push(verb, Answer::Close);
        self
    }

    /// Listen on a random local port and serve the script.
    ///
    /// # Panics
    ///
    /// * the listener cannot be bound
    pub async fn start(self) -> MockServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let address = match listener.local_addr().expect("local address") {
            std::net::SocketAddr::V4(address) => address,
            std::net::SocketAddr::V6(_) => unreachable!("bound on ipv4"),
        };

        let state = std::sync::Arc::new(State {
            script: std::sync::Mutex::new(self.script),
            ..State::default()
        });

        let accept = tokio::spawn({
            let state = state.clone();
            async move {
                while let Ok((socket, peer)) = listener.accept().await {
                    tracing::trace!(%peer, "mock server accepted a connection");
                    state
                        .connections
                        .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    tokio::spawn(serve(socket, state.clone()));
                }
            }
        });

        MockServer {
            address,
            state,
            accept,
        }
    }
}

async fn serve(socket: tokio::net::TcpStream, state: std::sync::Arc<State>) {
    let (read, mut write) = socket.into_split();
    let mut read = tokio::io::BufReader::new(read);

    let greeting = state.script().greeting.clone();
    if write.write_all(greeting.as_bytes()).await.is_err() {
        return;
    }

    let mut line = vec![];
    loop {
        line.clear();
        match read.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => (),
        }

        let line = String::from_utf8_lossy(&line).into_owned();
        let verb = line
            .split([' ', ':', '\r', '\n'])
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        state
            .received
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(line);

        let answer = state.script().answer(&verb);
        match answer {
            Answer::Reply(reply) => {
                if write.write_all(reply.as_bytes()).await.is_err() {
                    return;
                }
            }
            Answer::Silent => continue,
            Answer::Close => return,
        }

        if verb == "QUIT" {
            return;
        }
    }
}

/// Backstop SMTP server following a script, recording what it receives.
///
/// Every command is answered with `250 OK` (`221 Bye` for `QUIT`) unless
/// the script says otherwise.
#[derive(Debug)]
pub struct MockServer {
    address: std::net::SocketAddrV4,
    state: std::sync::Arc<State>,
    accept: tokio::task::JoinHandle<()>,
}

impl MockServer {
    /// Start writing a script.
    #[must_use]
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::default()
    }

    /// Address the server listens on.
    #[must_use]
    pub const fn address(&self) -> std::net::SocketAddrV4 {
        self.address
    }

    /// Lines received so far on every connection, line endings included.
    #[must_use]
    pub fn received(&self) -> Vec<String> {
        self.state
            .received
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of connections accepted so far.
    #[must_use]
    pub fn connections(&self) -> usize {
        self.state
            .connections
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    /// From now on, answer `reply` to `verb`.
    pub fn reply(&self, verb: &str, reply: &str) {
        self.state
            .script()
            .replace(verb, Answer::Reply(reply.to_string()));
    }

    /// From now on, never answer to `verb`.
    pub fn silent(&self, verb: &str) {
        self.state.script().replace(verb, Answer::Silent);
    }

    /// From now on, close the connection on `verb`.
    pub fn close_on(&self, verb: &str) {
        self.state.script().replace(verb, Answer::Close);
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept.abort();
    }
}
