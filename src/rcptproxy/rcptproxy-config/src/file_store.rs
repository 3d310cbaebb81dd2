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
use crate::{Key, Store, StoreError, Value};

/// Backing store kept in a TOML document, one top level entry per [`Key`].
///
/// ```toml
/// server_address = "192.168.1.10"
/// refresh = false
/// exclusions = ["127.0.0.1", "10.0.0.1"]
/// ```
///
/// The document is read once at [`FileStore::open`], every write is persisted
/// immediately.
#[derive(Debug)]
pub struct FileStore {
    path: std::path::PathBuf,
    values: tokio::sync::RwLock<std::collections::BTreeMap<Key, Value>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// * the file cannot be read
    /// * the document is not valid TOML or holds values of unsupported type
    /// * the document contains an unknown key
    pub async fn open(path: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let values = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), count = values.len(), "store opened");

        Ok(Self {
            path,
            values: tokio::sync::RwLock::new(values),
        })
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn parse(content: &str) -> Result<std::collections::BTreeMap<Key, Value>, StoreError> {
        toml::from_str::<std::collections::BTreeMap<String, Value>>(content)?
            .into_iter()
            .map(|(key, value)| {
                key.parse::<Key>()
                    .map(|key| (key, value))
                    .map_err(|_| StoreError::UnknownKey(key))
            })
            .collect()
    }

    fn render(values: &std::collections::BTreeMap<Key, Value>) -> Result<String, StoreError> {
        let document = values
            .iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<std::collections::BTreeMap<_, _>>();

        Ok(toml::to_string(&document)?)
    }
}

#[async_trait::async_trait]
impl Store for FileStore {
    async fn read(&self, key: Key) -> Result<Option<Value>, StoreError> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn write(&self, key: Key, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.write().await;
        values.insert(key, value);

        let content = Self::render(&values)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
