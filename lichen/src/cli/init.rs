// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use clap::{arg, ArgMatches, Command};
use thiserror::Error;

use lichen::client::{self, Client};
use lichen::{installation, remote, runtime, Installation, Remote};

pub fn command() -> Command {
    Command::new("init")
        .about("Initialize a client root")
        .long_about("Create a fresh client root and populate its index from the given remotes")
        .arg(arg!(<URL> ... "remote urls").value_parser(clap::value_parser!(String)))
}

/// Handle execution of `lichen init`
pub fn handle(args: &ArgMatches, root: &Path) -> Result<(), Error> {
    let remotes = args
        .get_many::<String>("URL")
        .into_iter()
        .flatten()
        .map(|raw| Remote::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let _lock = Installation::open(root).lock()?;

    runtime::block_on(Client::init(root, remotes))?;

    println!("Initialized {}", root.display());

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("remote")]
    Remote(#[from] remote::Error),

    #[error("client")]
    Client(#[from] client::Error),

    #[error("lock")]
    Lock(#[from] installation::LockError),
}
