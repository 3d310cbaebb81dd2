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
use rcptproxy_common::parse_ipv4;

/// Client addresses for which no verification is made.
///
/// The addresses are kept sorted and without duplicate so that lookups are a
/// binary search. The set has its own lock: it is never blocked by an SMTP
/// dialogue in progress.
#[derive(Debug, Default)]
pub struct ExclusionSet {
    addresses: std::sync::RwLock<Vec<std::net::Ipv4Addr>>,
}

impl ExclusionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from the textual entries of the store, see [`ExclusionSet::rebuild`].
    #[must_use]
    pub fn from_entries<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let out = Self::new();
        out.rebuild(entries);
        out
    }

    /// Replace the content of the set.
    ///
    /// The entries are dotted quad strings, the first empty entry ends the
    /// sequence. Malformed entries are skipped.
    pub fn rebuild<I, T>(&self, entries: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut addresses = entries
            .into_iter()
            .take_while(|entry| !entry.as_ref().is_empty())
            .filter_map(|entry| {
                let address = parse_ipv4(entry.as_ref());
                if address.is_none() {
                    tracing::warn!(entry = entry.as_ref(), "skipping malformed exclusion");
                }
                address
            })
            .collect::<Vec<_>>();

        addresses.sort_unstable();
        addresses.dedup();

        tracing::debug!(count = addresses.len(), "exclusion set rebuilt");
        *self
            .addresses
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = addresses;
    }

    /// Is `address` exempted from verification ?
    #[must_use]
    pub fn is_excluded(&self, address: std::net::Ipv4Addr) -> bool {
        self.addresses
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .binary_search(&address)
            .is_ok()
    }

    /// Number of addresses in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Is the set empty ?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the addresses, sorted.
    #[must_use]
    pub fn to_vec(&self) -> Vec<std::net::Ipv4Addr> {
        self.addresses
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl serde::Serialize for ExclusionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec().iter().map(ToString::to_string))
    }
}
