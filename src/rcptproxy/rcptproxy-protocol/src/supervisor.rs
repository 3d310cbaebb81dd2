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
use crate::SmtpConnection;

/// Close `connection` after `idle_timeout` without activity or once it is
/// older than `max_lifetime`, whichever comes first.
///
/// Exits as soon as the connection is down or dropped.
pub(crate) async fn run(
    weak: std::sync::Weak<SmtpConnection>,
    activity: std::sync::Arc<tokio::sync::Notify>,
) {
    loop {
        let wait = match weak.upgrade() {
            Some(connection) if connection.is_up() => connection.next_check(),
            _ => break,
        };

        let idle = tokio::time::timeout(wait, activity.notified())
            .await
            .is_err();

        let Some(connection) = weak.upgrade() else {
            break;
        };
        if !connection.is_up() {
            break;
        }

        if idle {
            tracing::debug!(
                server = %connection.configuration().server,
                age = ?connection.age(),
                "closing idle or aged connection"
            );
            connection.disconnect().await;
            break;
        }
    }

    tracing::trace!("supervisor terminated");
}
