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

/// Parse a dotted-quad IPv4 address.
///
/// Surrounding whitespace is ignored, each of the four fields must be made of
/// decimal digits only and fit in an octet. Leading zeros are accepted and read
/// as decimal (`010` is `10`), unlike [`std::net::Ipv4Addr::from_str`].
///
/// Returns `None` for anything else, which is used by the callers as the
/// "no address" sentinel.
///
/// ```
/// # use rcptproxy_common::parse_ipv4;
/// assert_eq!(parse_ipv4(" 192.168.0.1 "), Some(std::net::Ipv4Addr::new(192, 168, 0, 1)));
/// assert_eq!(parse_ipv4("192.168.0.256"), None);
/// ```
#[must_use]
pub fn parse_ipv4(input: &str) -> Option<std::net::Ipv4Addr> {
    let mut octets = [0_u8; 4];
    let mut fields = input.trim().split('.');

    for octet in &mut octets {
        let field = fields.next()?;
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = u8::try_from(field.parse::<u32>().ok()?).ok()?;
    }

    if fields.next().is_some() {
        return None;
    }

    Some(std::net::Ipv4Addr::from(octets))
}

#[cfg(test)]
mod tests {
    use super::parse_ipv4;
    use std::net::Ipv4Addr;

    #[rstest::rstest]
    #[case::loopback("127.0.0.1", Ipv4Addr::LOCALHOST)]
    #[case::leading_whitespace("   10.1.2.3", Ipv4Addr::new(10, 1, 2, 3))]
    #[case::trailing_whitespace("10.1.2.3\t\r\n", Ipv4Addr::new(10, 1, 2, 3))]
    #[case::leading_zeros("010.001.000.009", Ipv4Addr::new(10, 1, 0, 9))]
    #[case::broadcast("255.255.255.255", Ipv4Addr::BROADCAST)]
    #[case::unspecified("0.0.0.0", Ipv4Addr::UNSPECIFIED)]
    fn valid(#[case] input: &str, #[case] expected: Ipv4Addr) {
        pretty_assertions::assert_eq!(parse_ipv4(input), Some(expected));
    }

    #[rstest::rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::octet_too_large("192.168.0.256")]
    #[case::huge_field("1.2.3.99999999999999999999")]
    #[case::three_fields("192.168.0")]
    #[case::five_fields("192.168.0.1.5")]
    #[case::empty_field("192..0.1")]
    #[case::trailing_dot("192.168.0.1.")]
    #[case::sign("+1.2.3.4")]
    #[case::negative("1.2.-3.4")]
    #[case::letters("a.b.c.d")]
    #[case::hostname("localhost")]
    #[case::inner_whitespace("1. 2.3.4")]
    #[case::ipv6("::1")]
    fn invalid(#[case] input: &str) {
        pretty_assertions::assert_eq!(parse_ipv4(input), None);
    }

    #[test]
    fn round_trip_display() {
        for ip in [
            Ipv4Addr::new(1, 2, 3, 4),
            Ipv4Addr::new(172, 16, 254, 1),
            Ipv4Addr::new(8, 8, 8, 8),
        ] {
            pretty_assertions::assert_eq!(parse_ipv4(&ip.to_string()), Some(ip));
            pretty_assertions::assert_eq!(parse_ipv4(&format!(" {ip} ")), Some(ip));
        }
    }
}
