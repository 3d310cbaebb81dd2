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
use crate::{Key, StoreError, Value};

/// Key/value backing store of the settings.
///
/// The store is shared with the operator tooling and may be slow, every
/// access is asynchronous. A read returning `Ok(None)` means the key is absent.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Read the value of `key`.
    ///
    /// # Errors
    ///
    /// * the store is not reachable
    async fn read(&self, key: Key) -> Result<Option<Value>, StoreError>;

    /// Write (create or replace) the value of `key`.
    ///
    /// # Errors
    ///
    /// * the store is not reachable or cannot persist the value
    async fn write(&self, key: Key, value: Value) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn read(&self, key: Key) -> Result<Option<Value>, StoreError> {
        (**self).read(key).await
    }

    async fn write(&self, key: Key, value: Value) -> Result<(), StoreError> {
        (**self).write(key, value).await
    }
}

/// In-process store, used by hosts owning their settings and by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: std::sync::RwLock<std::collections::BTreeMap<Key, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `key` from the store.
    ///
    /// # Errors
    ///
    /// * the lock of the store is poisoned
    pub fn remove(&self, key: Key) -> Result<Option<Value>, StoreError> {
        Ok(self
            .values
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .remove(&key))
    }
}

impl FromIterator<(Key, Value)> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = (Key, Value)>>(iter: T) -> Self {
        Self {
            values: std::sync::RwLock::new(iter.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn read(&self, key: Key) -> Result<Option<Value>, StoreError> {
        Ok(self
            .values
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .get(&key)
            .cloned())
    }

    async fn write(&self, key: Key, value: Value) -> Result<(), StoreError> {
        self.values
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(key, value);
        Ok(())
    }
}
