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
use crate::Commands;
use rcptproxy_config::FileStore;

mod config_show;
mod refresh;
mod verify;

pub use config_show::config_show;
pub use refresh::refresh;
pub use verify::verify;

impl Commands {
    /// Run the command against `store`, writing its report to `output`.
    ///
    /// # Errors
    ///
    /// * the store cannot be read or written
    /// * the report cannot be written
    pub async fn execute<OUT: std::io::Write + Send>(
        self,
        store: FileStore,
        output: &mut OUT,
    ) -> anyhow::Result<()> {
        match self {
            Self::Verify {
                recipients,
                client_ip,
                raw,
            } => verify(store, &recipients, &client_ip, raw, output).await,
            Self::ConfigShow => config_show(&store, output).await,
            Self::Refresh => refresh(&store, output).await,
        }
    }
}
