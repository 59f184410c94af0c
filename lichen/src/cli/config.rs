// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use clap::{arg, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use thiserror::Error;

use lichen::client::{self, Client};
use lichen::index;
use spec::{Name, Spec, NV};

/// Which compiler flag projection to emit
enum Mode {
    Include,
    Bytelink,
    Asmlink,
}

pub fn command() -> Command {
    Command::new("config")
        .about("Print compiler configuration flags")
        .long_about("Emit include or link flags for installed packages, ready to splice into a compiler invocation")
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Close over dependencies")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("include").long("include").action(ArgAction::SetTrue))
        .arg(Arg::new("bytelink").long("bytelink").action(ArgAction::SetTrue))
        .arg(Arg::new("asmlink").long("asmlink").action(ArgAction::SetTrue))
        .group(
            ArgGroup::new("mode")
                .args(["include", "bytelink", "asmlink"])
                .required(true),
        )
        .arg(arg!(<NAME> ... "package names").value_parser(clap::value_parser!(String)))
}

/// Handle execution of `lichen config`
pub fn handle(args: &ArgMatches, root: &Path) -> Result<(), Error> {
    let recursive = args.get_flag("recursive");
    let mode = if args.get_flag("include") {
        Mode::Include
    } else if args.get_flag("bytelink") {
        Mode::Bytelink
    } else {
        Mode::Asmlink
    };

    let client = Client::open(root)?;
    let installed = client.installed()?;

    // Resolve each requested name to its installed release
    let mut roots = Vec::new();
    for raw in args.get_many::<String>("NAME").into_iter().flatten() {
        let name: Name = raw
            .parse()
            .map_err(|_| Error::UnknownPackage(raw.clone()))?;
        let version = installed
            .get(&name)
            .ok_or_else(|| Error::UnknownPackage(raw.clone()))?;

        roots.push(NV::new(name, version.clone()));
    }

    let targets = if recursive {
        // dependency closure over the installed set, dependencies first
        let universe = installed
            .iter()
            .map(|(name, version)| {
                let nv = NV::new(name.clone(), version.clone());
                let body = index::spec(&client.installation, &nv)?;

                Ok(solver::Package {
                    nv,
                    installed: true,
                    depends: body.depends,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let names = roots.iter().map(|nv| nv.name.clone()).collect::<Vec<_>>();
        solver::filter_backward_dependencies(&universe, &names)?
    } else {
        roots
    };

    let mut fragments = Vec::new();
    for nv in &targets {
        let body = index::spec(&client.installation, nv)?;
        fragments.push(fragment(&client, nv, &body, &mode));
    }

    println!("{}", fragments.join(" "));

    Ok(())
}

fn fragment(client: &Client, nv: &NV, body: &Spec, mode: &Mode) -> String {
    let lib_dir = client.installation.lib_dir(&nv.name);
    let include = format!("-I {}", lib_dir.display());

    let extension = match mode {
        Mode::Include => return include,
        Mode::Bytelink => "cma",
        Mode::Asmlink => "cmxa",
    };

    let mut parts = vec![include];

    // Both link projections read the same option string
    if !body.link_options.is_empty() {
        parts.push(body.link_options.clone());
    }

    parts.extend(
        body.libraries
            .iter()
            .map(|library| format!("{library}.{extension}")),
    );

    parts.join(" ")
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown package {0}")]
    UnknownPackage(String),

    #[error("client")]
    Client(#[from] client::Error),

    #[error("index")]
    Index(#[from] index::Error),

    #[error("solver")]
    Solver(#[from] solver::Error),
}
