// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use clap::{ArgMatches, Command};
use thiserror::Error;

use lichen::client::{self, Client};
use lichen::{installation, runtime, Installation};

pub fn command() -> Command {
    Command::new("update")
        .about("Update the package index")
        .long_about("Fetch new package specs from every configured remote")
}

/// Handle execution of `lichen update`
pub fn handle(_args: &ArgMatches, root: &Path) -> Result<(), Error> {
    let _lock = Installation::open(root).lock()?;
    let client = Client::open(root)?;

    runtime::block_on(client.update())?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("client")]
    Client(#[from] client::Error),

    #[error("lock")]
    Lock(#[from] installation::LockError),
}
