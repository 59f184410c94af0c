// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use clap::{arg, ArgMatches, Command};
use thiserror::Error;

use lichen::client::{self, Client};
use lichen::remote::Scheme;
use lichen::{installation, remote, Installation, Remote};

pub fn command() -> Command {
    Command::new("remote")
        .about("Manage remotes")
        .long_about("Manage the package sources this client pulls from")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List configured remotes"))
        .subcommand(
            Command::new("add")
                .about("Add a remote")
                .arg(arg!(<URL> "remote url").value_parser(clap::value_parser!(String))),
        )
        .subcommand(
            Command::new("add-git")
                .about("Add a git remote")
                .arg(arg!(<URL> "repository url").value_parser(clap::value_parser!(String))),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove remotes matching a url or hostname")
                .arg(arg!(<URL> "url or hostname").value_parser(clap::value_parser!(String))),
        )
}

/// Handle subcommands to `lichen remote`
pub fn handle(args: &ArgMatches, root: &Path) -> Result<(), Error> {
    match args.subcommand() {
        Some(("list", _)) => list(root),
        Some(("add", cmd_args)) => {
            let url = cmd_args.get_one::<String>("URL").unwrap();
            add(root, Remote::parse(url)?)
        }
        Some(("add-git", cmd_args)) => {
            let url = cmd_args.get_one::<String>("URL").unwrap();
            add(root, Remote::parse_git(url)?)
        }
        Some(("rm", cmd_args)) => rm(root, cmd_args.get_one::<String>("URL").unwrap()),
        _ => unreachable!(),
    }
}

fn list(root: &Path) -> Result<(), Error> {
    let client = Client::open(root)?;

    for remote in &client.remotes {
        let prefix = match remote.scheme() {
            Scheme::Git => "git ",
            Scheme::Opam => "OPAM ",
        };

        println!("{prefix}{remote}");
    }

    Ok(())
}

fn add(root: &Path, remote: Remote) -> Result<(), Error> {
    let _lock = Installation::open(root).lock()?;
    let mut client = Client::open(root)?;

    client.add_remote(remote)?;

    Ok(())
}

fn rm(root: &Path, input: &str) -> Result<(), Error> {
    let _lock = Installation::open(root).lock()?;
    let mut client = Client::open(root)?;

    client.remove_remote(input)?;

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
