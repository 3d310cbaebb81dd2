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
use rcptproxy_callout::{Denial, DenyAction, Outcome, Verifier};
use rcptproxy_config::{Key, MemoryStore, Store, Value};

const CLIENT: Option<&str> = Some("192.168.1.7");

#[rstest::rstest]
#[case::allowed("250 OK\r\n", "250 Accepted\r\n", Outcome::Allowed)]
#[case::refused_sender("451 try later\r\n", "250 OK\r\n", Outcome::NotPerformed)]
#[case::denied("250 OK\r\n", "550 No such user\r\n", Outcome::Denied(Denial {
    status: 550,
    response: "550 Unable to relay to john.doe@example.com\r\n".to_string(),
    action: DenyAction::DropSession,
}))]
#[test_log::test(tokio::test)]
async fn scenario(#[case] mail: &str, #[case] rcpt: &str, #[case] expected: Outcome) {
    let server = MockServer::builder()
        .reply("MAIL", mail)
        .reply("RCPT", rcpt)
        .start()
        .await;
    let verifier = Verifier::new(local_store(server.address()));

    pretty_assertions::assert_eq!(
        verifier.verify("<John.Doe@Example.com>", CLIENT).await,
        expected
    );
    verifier.shutdown().await;
}

#[tokio::test]
async fn operator_response() {
    let server = MockServer::builder()
        .reply("RCPT", "550 No such user\r\n")
        .start()
        .await;
    let store = local_store(server.address());
    store
        .write(Key::DenyMessage, Value::from("Mailbox unknown"))
        .await
        .unwrap();
    store.write(Key::DenyStatus, Value::Integer(450)).await.unwrap();
    store
        .write(Key::ForceDisconnect, Value::Boolean(false))
        .await
        .unwrap();
    let verifier = Verifier::new(store);

    pretty_assertions::assert_eq!(
        verifier.verify("nobody@example.com", CLIENT).await,
        Outcome::Denied(Denial {
            status: 450,
            response: "450 Mailbox unknown\r\n".to_string(),
            action: DenyAction::Transient,
        })
    );
    verifier.shutdown().await;
}

#[tokio::test]
async fn raw_command() {
    let server = MockServer::builder().start().await;
    let verifier = Verifier::new(local_store(server.address()));

    pretty_assertions::assert_eq!(
        verifier
            .verify_command("rcpt to:<User@Example.com> NOTIFY=NEVER\r\n", CLIENT)
            .await,
        Outcome::Allowed
    );
    assert!(server
        .received()
        .contains(&"RCPT TO:<user@example.com>\r\n".to_string()));

    pretty_assertions::assert_eq!(
        verifier
            .verify_command("MAIL FROM:<user@example.com>\r\n", CLIENT)
            .await,
        Outcome::NotApplicable
    );
    verifier.shutdown().await;
}

#[rstest::rstest]
#[case::no_client("user@example.com", None)]
#[case::bad_client("user@example.com", Some("10.0.0"))]
#[case::empty_recipient("  ", CLIENT)]
#[case::bad_recipient("<user@example.com", CLIENT)]
#[tokio::test]
async fn not_applicable_without_dial(#[case] recipient: &str, #[case] client: Option<&str>) {
    let server = MockServer::builder().start().await;
    let verifier = Verifier::new(local_store(server.address()));

    pretty_assertions::assert_eq!(
        verifier.verify(recipient, client).await,
        Outcome::NotApplicable
    );
    pretty_assertions::assert_eq!(server.connections(), 0);
}

#[tokio::test]
async fn unreachable_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let std::net::SocketAddr::V4(address) = listener.local_addr().unwrap() else {
        panic!("listener is not ipv4")
    };
    drop(listener);
    let verifier = Verifier::new(local_store(address));

    assert!(matches!(
        verifier.try_verify("user@example.com", CLIENT).await,
        Err(rcptproxy_callout::Error::Transport(_))
    ));
    pretty_assertions::assert_eq!(
        verifier.verify("user@example.com", CLIENT).await,
        Outcome::NotPerformed
    );
    assert!(verifier.cache().is_empty().await);
}

#[tokio::test]
async fn missing_configuration() {
    let verifier = Verifier::new(MemoryStore::new());

    assert!(matches!(
        verifier.try_verify("user@example.com", CLIENT).await,
        Err(rcptproxy_callout::Error::Config(_))
    ));
    pretty_assertions::assert_eq!(
        verifier.verify("user@example.com", CLIENT).await,
        Outcome::NotPerformed
    );
}

#[tokio::test]
async fn silent_server_times_out() {
    let server = MockServer::builder().silent("RCPT").start().await;
    let store = local_store(server.address());
    store
        .write(Key::RequestDelay, Value::Integer(200))
        .await
        .unwrap();
    let verifier = Verifier::new(store);

    let started = std::time::Instant::now();
    pretty_assertions::assert_eq!(
        verifier.verify("user@example.com", CLIENT).await,
        Outcome::NotPerformed
    );
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
    verifier.shutdown().await;
}
