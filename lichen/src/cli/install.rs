// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use clap::{arg, ArgMatches, Command};
use thiserror::Error;

use lichen::client::{apply, transaction, Client};
use lichen::{installation, Installation};
use solver::Request;

pub fn command() -> Command {
    Command::new("install")
        .about("Install packages")
        .long_about("Install packages by name, or pinned as name-version")
        .arg(arg!(<NAME> ... "packages to install").value_parser(clap::value_parser!(String)))
}

/// Handle execution of `lichen install`
pub fn handle(args: &ArgMatches, root: &Path) -> Result<(), Error> {
    let pkgs = args
        .get_many::<String>("NAME")
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>();
    let yes = *args.get_one::<bool>("yes").unwrap();

    let _lock = Installation::open(root).lock()?;
    let client = Client::open(root)?;

    let request = Request {
        wish_install: pkgs
            .iter()
            .map(|pkg| transaction::install_wish(&client, pkg))
            .collect::<Result<Vec<_>, _>>()?,
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
