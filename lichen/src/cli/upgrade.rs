// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use clap::{ArgMatches, Command};
use thiserror::Error;

use lichen::client::{apply, transaction, Client};
use lichen::{installation, Installation};
use solver::{Request, Wish};

pub fn command() -> Command {
    Command::new("upgrade")
        .about("Upgrade the system")
        .long_about("Upgrade every installed package to its latest known version")
}

/// Handle execution of `lichen upgrade`
pub fn handle(args: &ArgMatches, root: &Path) -> Result<(), Error> {
    let yes = *args.get_one::<bool>("yes").unwrap();

    let _lock = Installation::open(root).lock()?;
    let client = Client::open(root)?;

    let installed = client.installed()?;
    if installed.is_empty() {
        println!("No packages installed");
        return Ok(());
    }

    let request = Request {
        wish_upgrade: installed
            .iter()
            .map(|(name, _)| Wish::any(name.clone()))
            .collect(),
        ..Default::default()
    };

    if let Some(solution) = transaction::select(&client, &request, yes)? {
        apply::apply(&client, &solution, yes)?;
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("client")]
    Client(#[from] lichen::client::Error),

    #[error("transaction")]
    Transaction(#[from] transaction::Error),

    #[error("apply")]
    Apply(#[from] apply::Error),

    #[error("lock")]
    Lock(#[from] installation::LockError),
}
