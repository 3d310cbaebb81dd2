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
use crate::{config::local_store, MockServer};
use rcptproxy_callout::{Outcome, Verifier};
use std::sync::Arc;

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_verifications_share_one_connection() {
    let server = MockServer::builder()
        .reply("RCPT", "250 OK\r\n")
        .start()
        .await;
    let verifier = Arc::new(Verifier::new(local_store(server.address())));

    let tasks = (0..16)
        .map(|i| {
            let verifier = verifier.clone();
            tokio::spawn(async move {
                verifier
                    .verify(&format!("user{i}@example.com"), Some("192.168.1.7"))
                    .await
            })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        pretty_assertions::assert_eq!(task.await.unwrap(), Outcome::Allowed);
    }
    pretty_assertions::assert_eq!(server.connections(), 1);

    let received = server.received();
    pretty_assertions::assert_eq!(
        received.iter().filter(|line| line.starts_with("RCPT")).count(),
        16
    );
    // each RCPT TO directly follows its MAIL FROM
    for (index, line) in received.iter().enumerate() {
        if line.starts_with("RCPT") {
            assert!(received[index - 1].starts_with("MAIL FROM:"));
        }
    }

    verifier.shutdown().await;
}

#[tokio::test]
async fn refused_sender_forces_reconnection() {
    let server = MockServer::builder()
        .reply("MAIL", "421 closing\r\n")
        .reply("MAIL", "250 OK\r\n")
        .start()
        .await;
    let verifier = Verifier::new(local_store(server.address()));

    pretty_assertions::assert_eq!(
        verifier.verify("user@example.com", Some("192.168.1.7")).await,
        Outcome::NotPerformed
    );
    pretty_assertions::assert_eq!(
        verifier.verify("user@example.com", Some("192.168.1.7")).await,
        Outcome::Allowed
    );
    pretty_assertions::assert_eq!(server.connections(), 2);
    verifier.shutdown().await;
}

#[tokio::test]
async fn server_dropping_connection() {
    let server = MockServer::builder().start().await;
    let verifier = Verifier::new(local_store(server.address()));

    pretty_assertions::assert_eq!(
        verifier.verify("user@example.com", Some("192.168.1.7")).await,
        Outcome::Allowed
    );

    server.close_on("RSET");
    pretty_assertions::assert_eq!(
        verifier.verify("user@example.com", Some("192.168.1.7")).await,
        Outcome::Allowed
    );
    pretty_assertions::assert_eq!(server.connections(), 2);
    verifier.shutdown().await;
}

#[tokio::test]
async fn shutdown_says_goodbye() {
    let server = MockServer::builder().start().await;
    let verifier = Verifier::new(local_store(server.address()));

    verifier.verify("user@example.com", Some("192.168.1.7")).await;
    verifier.shutdown().await;

    pretty_assertions::assert_eq!(server.received().last().unwrap(), "QUIT\r\n");
    assert!(verifier.cache().is_empty().await);
}
