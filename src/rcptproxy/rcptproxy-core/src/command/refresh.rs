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
use anyhow::Context;
use rcptproxy_config::{Key, Store, Value};

/// Set the refresh flag, the next verification rebuilds the connection.
///
/// # Errors
///
/// * the store cannot be written
/// * the output cannot be written
pub async fn refresh<S: Store, OUT: std::io::Write + Send>(
    store: &S,
    output: &mut OUT,
) -> anyhow::Result<()> {
    store
        .write(Key::Refresh, Value::Boolean(true))
        .await
        .context("Cannot request a refresh")?;

    output.write_all(b"refresh requested\n")?;
    Ok(())
}
