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

/// How the host should reject the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DenyAction {
    /// Reject the command with a transient (4xx) failure.
    Transient,
    /// Reject the command with a permanent failure.
    Permanent,
    /// Reject the command and drop the client session.
    DropSession,
}

/// Rejection of a recipient, as configured by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    /// Status code of the response.
    pub status: u16,
    /// Response handed to the client, CRLF terminated.
    pub response: String,
    /// How the host should apply the rejection.
    pub action: DenyAction,
}

impl Denial {
    /// Build the rejection of `recipient` according to `configuration`.
    #[must_use]
    pub fn new(configuration: &ConfigurationSnapshot, recipient: &str) -> Self {
        let action = if configuration.force_disconnect {
            DenyAction::DropSession
        } else if configuration.deny_status < 500 {
            DenyAction::Transient
        } else {
            DenyAction::Permanent
        };

        Self {
            status: configuration.deny_status,
            response: configuration.deny_response(recipient),
            action,
        }
    }
}

/// Result of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No verification applies: the client is excluded or the input is malformed.
    NotApplicable,
    /// The verification could not be carried out, apply the default policy.
    NotPerformed,
    /// The backstop server accepts the recipient.
    Allowed,
    /// The backstop server refuses the recipient.
    Denied(Denial),
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("not-applicable"),
            Self::NotPerformed => f.write_str("not-performed"),
            Self::Allowed => f.write_str("allowed"),
            Self::Denied(denial) => write!(
                f,
                "denied ({}): {}",
                denial.action,
                denial.response.trim_end()
            ),
        }
    }
}
