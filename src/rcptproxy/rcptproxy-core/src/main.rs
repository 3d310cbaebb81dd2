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
use clap::{crate_name, crate_version};
use rcptproxy::Args;
use rcptproxy_config::FileStore;

#[tokio::main]
async fn main() {
    if let Err(err) = try_main().await {
        let error = format!("rcptproxy terminating error: '{err}'");

        eprintln!("{error}");
        tracing::error!(error);
        err.chain().skip(1).for_each(|cause| {
            let reason = format!("because: {cause}");

            eprintln!("{reason}");
            tracing::error!(reason);
        });
        std::process::exit(1);
    }
}

async fn try_main() -> anyhow::Result<()> {
    let args = <Args as clap::Parser>::parse();

    if args.version {
        println!("{} v{}", crate_name!(), crate_version!());
        return Ok(());
    }

    rcptproxy::tracing_subscriber::initialize(&args)?;

    let Some(command) = args.command else {
        anyhow::bail!("no command specified, see --help")
    };

    let store = FileStore::open(&args.config)
        .await
        .with_context(|| format!("Cannot open the store '{}'", args.config))?;
    tracing::debug!(store = %store.path().display(), "store opened");

    command.execute(store, &mut std::io::stdout()).await
}
