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

/// Errors produced while reading what the host supplied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InputError {
    /// The recipient is empty once trimmed.
    #[error("empty recipient address")]
    EmptyRecipient,
    /// The recipient has unbalanced or misplaced angle brackets.
    #[error("invalid recipient address: {0:?}")]
    InvalidRecipient(String),
    /// The command line is too short or is not formatted as `RCPT TO:`.
    #[error("invalid SMTP protocol command: {0:?}")]
    InvalidCommand(String),
    /// The client address is not a dotted-quad IPv4 address.
    #[error("invalid client IP address: {0:?}")]
    InvalidClientAddress(String),
}

const RCPT_PREFIX: &str = "RCPT TO:";

/// Extract the mailbox of a recipient, as found after `RCPT TO:`.
///
/// The result is trimmed and lower-cased. A bracketed path `<user@domain>`
/// yields `user@domain`, anything following the closing bracket (ESMTP
/// parameters) is ignored, and the null path `<>` is kept as is.
///
/// # Errors
///
/// * the recipient is empty
/// * an opening bracket is never closed
/// * brackets appear in an unbracketed mailbox
pub fn parse_recipient(input: &str) -> Result<String, InputError> {
    let recipient = input.trim().to_lowercase();
    if recipient.is_empty() {
        return Err(InputError::EmptyRecipient);
    }

    match recipient.strip_prefix('<') {
        Some(path) => match path.find('>') {
            None => Err(InputError::InvalidRecipient(input.to_string())),
            Some(0) => Ok("<>".to_string()),
            Some(close) => Ok(path[..close].to_string()),
        },
        None if recipient.contains(['<', '>']) => {
            Err(InputError::InvalidRecipient(input.to_string()))
        }
        None => Ok(recipient),
    }
}

/// Extract the recipient of a raw `RCPT TO:` command line.
///
/// # Errors
///
/// * the line is not a `RCPT TO:` command (case-insensitive)
/// * see [`parse_recipient`]
pub fn parse_rcpt_command(line: &str) -> Result<String, InputError> {
    let line = line.trim_start();
    match line.get(..RCPT_PREFIX.len()) {
        Some(verb) if verb.eq_ignore_ascii_case(RCPT_PREFIX) => {
            parse_recipient(&line[RCPT_PREFIX.len()..])
        }
        _ => Err(InputError::InvalidCommand(line.to_string())),
    }
}
