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
use rcptproxy_callout::{Outcome, Verifier};
use rcptproxy_config::Store;

/// Verify every recipient concurrently through one verifier and print one
/// outcome per recipient, in order.
///
/// # Errors
///
/// * the output cannot be written
pub async fn verify<S, OUT>(
    store: S,
    recipients: &[String],
    client_ip: &str,
    raw: bool,
    output: &mut OUT,
) -> anyhow::Result<()>
where
    S: Store + 'static,
    OUT: std::io::Write + Send,
{
    let verifier = std::sync::Arc::new(Verifier::new(store));

    let tasks = recipients
        .iter()
        .map(|recipient| {
            let verifier = verifier.clone();
            let recipient = recipient.clone();
            let client_ip = client_ip.to_string();
            tokio::spawn(async move {
                if raw {
                    verifier.verify_command(&recipient, Some(client_ip.as_str())).await
                } else {
                    verifier.verify(&recipient, Some(client_ip.as_str())).await
                }
            })
        })
        .collect::<Vec<_>>();

    let mut outcomes = Vec::with_capacity(tasks.len());
    for task in tasks {
        outcomes.push(task.await.unwrap_or_else(|error| {
            tracing::error!(%error, "verification task failed");
            Outcome::NotPerformed
        }));
    }

    verifier.shutdown().await;

    for (recipient, outcome) in recipients.iter().zip(outcomes) {
        output.write_fmt(format_args!("{}: {outcome}\n", recipient.trim_end()))?;
    }

    Ok(())
}
