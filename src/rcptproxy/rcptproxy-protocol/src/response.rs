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
use crate::{
    transport::{Assembly, ResponseAssembler},
    Error,
};

/// Length of the status code and its separator.
const STATUS_WIDTH: usize = 4;

/// Reply of the server, assembled line by line.
///
/// A line feed ends a line, every other byte is part of the line. Each line
/// starts with a 3 digits status code followed by `-` on continuation lines
/// and by a space on the final line.
#[derive(Debug, Default)]
pub struct Response {
    lines: Vec<String>,
    partial: String,
    status: Option<u16>,
}

impl Response {
    /// Create an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the content, ready to assemble the next reply.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.partial.clear();
        self.status = None;
    }

    /// Lines received so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Status of the final line, `None` until the reply is complete.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Check the status field of `line`, returns the status when it is the final line.
    fn parse_line(line: &str) -> Result<Option<u16>, Error> {
        let bytes = line.as_bytes();
        if line.chars().count() < STATUS_WIDTH {
            return Err(Error::TooShort {
                line: line.to_string(),
            });
        }

        let invalid = || Error::InvalidResponse {
            line: line.to_string(),
        };
        match bytes[..3] {
            [b'2'..=b'5', b'0'..=b'9', b'0'..=b'9'] => (),
            _ => return Err(invalid()),
        }

        let status = bytes[..3]
            .iter()
            .fold(0_u16, |status, digit| status * 10 + u16::from(digit - b'0'));

        match bytes[3] {
            b' ' => Ok(Some(status)),
            b'-' => Ok(None),
            _ => Err(invalid()),
        }
    }
}

impl ResponseAssembler for Response {
    type Error = Error;

    fn on_receive(&mut self, data: &[u8]) -> Result<Assembly, Self::Error> {
        for byte in data {
            if *byte != b'\n' {
                self.partial.push(char::from(*byte));
                continue;
            }

            let line = std::mem::take(&mut self.partial);
            let status = Self::parse_line(&line)?;
            self.lines.push(line);

            if status.is_some() {
                self.status = status;
                return Ok(Assembly::Complete);
            }
        }
        Ok(Assembly::Partial)
    }
}

#[cfg(test)]
mod tests {
    use super::Response;
    use crate::{
        transport::{Assembly, ResponseAssembler},
        Error,
    };

    fn assemble(chunks: &[&str]) -> Result<(Assembly, Response), Error> {
        let mut response = Response::new();
        let mut progress = Assembly::Partial;
        for chunk in chunks {
            progress = response.on_receive(chunk.as_bytes())?;
        }
        Ok((progress, response))
    }

    #[rstest::rstest]
    #[case::single(&["250 OK\r\n"], 250, 1)]
    #[case::multi(&["250-more\r\n250 OK\r\n"], 250, 2)]
    #[case::split(&["25", "0-mx.example.com\r", "\n250-SIZE\r\n2", "50 HELP\r\n"], 250, 3)]
    #[case::greeting(&["220 mx.example.com ESMTP\r\n"], 220, 1)]
    #[case::bare_line_feed(&["550 No such user\n"], 550, 1)]
    #[case::no_text(&["354 \r\n"], 354, 1)]
    fn complete(#[case] chunks: &[&str], #[case] status: u16, #[case] count: usize) {
        let (progress, response) = assemble(chunks).unwrap();

        pretty_assertions::assert_eq!(progress, Assembly::Complete);
        pretty_assertions::assert_eq!(response.status(), Some(status));
        pretty_assertions::assert_eq!(response.lines().len(), count);
    }

    #[test]
    fn partial() {
        let (progress, response) = assemble(&["250-first\r\n250 OK"]).unwrap();

        pretty_assertions::assert_eq!(progress, Assembly::Partial);
        pretty_assertions::assert_eq!(response.status(), None);
        pretty_assertions::assert_eq!(response.lines(), ["250-first\r"]);
    }

    #[test]
    fn stops_at_final_line() {
        let mut response = Response::new();

        pretty_assertions::assert_eq!(
            response.on_receive(b"250 OK\r\n221 extra\r\n").unwrap(),
            Assembly::Complete
        );
        pretty_assertions::assert_eq!(response.lines().len(), 1);
    }

    #[test]
    fn control_characters_are_content() {
        let (_, response) = assemble(&["250 a\tb\x01\r\n"]).unwrap();

        pretty_assertions::assert_eq!(response.lines(), ["250 a\tb\x01\r"]);
    }

    #[rstest::rstest]
    #[case::short(b"25\n")]
    #[case::short_final(b"250-more\r\n250\n")]
    #[case::empty(b"\n")]
    fn too_short(#[case] data: &[u8]) {
        let mut response = Response::new();

        assert!(matches!(
            response.on_receive(data),
            Err(Error::TooShort { .. })
        ));
    }

    #[rstest::rstest]
    #[case::letters(b"2a0 OK\r\n")]
    #[case::class_one(b"150 OK\r\n")]
    #[case::class_six(b"600 OK\r\n")]
    #[case::separator(b"250_OK\r\n")]
    #[case::continuation_garbage(b"250-ok\r\nabcd\r\n")]
    fn invalid(#[case] data: &[u8]) {
        let mut response = Response::new();

        assert!(matches!(
            response.on_receive(data),
            Err(Error::InvalidResponse { .. })
        ));
    }

    #[test]
    fn clear() {
        let (_, mut response) = assemble(&["250 OK\r\n"]).unwrap();
        response.clear();

        pretty_assertions::assert_eq!(response.status(), None);
        assert!(response.lines().is_empty());
    }
}
