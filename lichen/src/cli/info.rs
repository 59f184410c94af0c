// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use clap::{arg, ArgMatches, Command};
use itertools::Itertools;
use thiserror::Error;

use lichen::client::{self, Client};
use lichen::{environment, index};
use spec::Name;

pub fn command() -> Command {
    Command::new("info")
        .about("Query packages")
        .long_about("Show every known version and the description of a package")
        .arg(arg!(<NAME> "package name").value_parser(clap::value_parser!(String)))
}

/// Handle execution of `lichen info`
pub fn handle(args: &ArgMatches, root: &Path) -> Result<(), Error> {
    let raw = args.get_one::<String>("NAME").unwrap();
    let name: Name = raw
        .parse()
        .map_err(|_| Error::UnknownPackage(raw.clone()))?;

    let client = Client::open(root)?;
    let installed = client.installed()?;

    let known = index::versions(&client.installation, &name)?;
    if known.is_empty() {
        return Err(Error::UnknownPackage(raw.clone()));
    }

    let current = installed.get(&name);

    let others = known
        .iter()
        .filter(|nv| current != Some(&nv.version))
        .map(|nv| nv.version.to_string())
        .join(" ");

    // Describe the installed release, else the highest known one
    let described = known
        .iter()
        .find(|nv| current == Some(&nv.version))
        .or_else(|| known.iter().max_by(|a, b| a.version.cmp(&b.version)))
        .expect("known versions are non-empty");
    let body = index::spec(&client.installation, described)?;

    println!("{:>20}: {name}", "package");
    println!(
        "{:>20}: {}",
        "installed-version",
        current
            .map(ToString::to_string)
            .unwrap_or_else(|| environment::NOT_INSTALLED.to_owned())
    );
    println!("{:>20}: {others}", "other-versions");
    println!("{:>20}: {}", "description", body.description);

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown package {0}")]
    UnknownPackage(String),

    #[error("client")]
    Client(#[from] client::Error),

    #[error("index")]
    Index(#[from] index::Error),
}
