// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::collections::BTreeMap;
use std::io::stdout;
use std::path::Path;

use clap::{ArgMatches, Command};
use thiserror::Error;

use lichen::client::{self, Client};
use lichen::{environment, index};
use spec::{Name, NV};
use tui::pretty::{print_rows, Row};

pub fn command() -> Command {
    Command::new("list")
        .about("List packages")
        .long_about("List every known package with its installed version and synopsis")
}

/// Handle execution of `lichen list`
pub fn handle(_args: &ArgMatches, root: &Path) -> Result<(), Error> {
    let client = Client::open(root)?;
    let installed = client.installed()?;

    let mut grouped: BTreeMap<Name, Vec<NV>> = BTreeMap::new();
    for nv in index::entries(&client.installation)? {
        grouped.entry(nv.name.clone()).or_default().push(nv);
    }

    let mut rows = Vec::new();

    for (name, known) in grouped {
        let current = installed.get(&name);

        // Describe the installed release when there is one, else the
        // first the index offered
        let shown = known
            .iter()
            .find(|nv| current == Some(&nv.version))
            .or_else(|| known.first());
        let Some(shown) = shown else {
            continue;
        };

        let body = index::spec(&client.installation, shown)?;

        rows.push(Row {
            name: name.to_string(),
            version: current
                .map(ToString::to_string)
                .unwrap_or_else(|| environment::NOT_INSTALLED.to_owned()),
            synopsis: body.synopsis().to_owned(),
        });
    }

    print_rows(&mut stdout().lock(), &rows, environment::NOT_INSTALLED.len())?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("client")]
    Client(#[from] client::Error),

    #[error("index")]
    Index(#[from] index::Error),

    #[error("io")]
    Io(#[from] std::io::Error),
}
