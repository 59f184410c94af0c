// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use clap::{arg, ArgMatches, Command};
use thiserror::Error;

use lichen::client::{publish, Client};
use lichen::{installation, runtime, Installation};

pub fn command() -> Command {
    Command::new("upload")
        .about("Publish a package")
        .long_about("Publish a local spec and its source archive to the configured remotes")
        .arg(arg!(<SPEC> "spec file or package name").value_parser(clap::value_parser!(String)))
}

/// Handle execution of `lichen upload`
pub fn handle(args: &ArgMatches, root: &Path) -> Result<(), Error> {
    let input = args.get_one::<String>("SPEC").unwrap();
    let yes = *args.get_one::<bool>("yes").unwrap();

    let _lock = Installation::open(root).lock()?;
    let client = Client::open(root)?;

    runtime::block_on(publish::upload(&client, input, yes))?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("client")]
    Client(#[from] lichen::client::Error),

    #[error("publish")]
    Publish(#[from] publish::Error),

    #[error("lock")]
    Lock(#[from] installation::LockError),
}
