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
use rcptproxy_config::{ConfigurationSnapshot, Store};

/// Print the complete settings as json, without acknowledging a pending
/// refresh request.
///
/// # Errors
///
/// * the settings cannot be loaded
/// * the output cannot be written
pub async fn config_show<S: Store, OUT: std::io::Write + Send>(
    store: &S,
    output: &mut OUT,
) -> anyhow::Result<()> {
    let snapshot = ConfigurationSnapshot::read_complete(store, &std::sync::Arc::default())
        .await
        .context("Cannot load the settings")?;

    output.write_fmt(format_args!(
        "{}\n",
        serde_json::to_string_pretty(&snapshot)?
    ))?;

    Ok(())
}
