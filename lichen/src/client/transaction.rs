// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Bridge between user wishes and the solver, including the candidate
//! solution selection dialogue.

use thiserror::Error;

use solver::{Request, Solution, Wish};
use spec::NV;

use crate::index;

use super::{confirm, Client};

/// Turn an `install` argument into a wish: a plain name, or a
/// `name-version` pin
pub fn install_wish(client: &Client, input: &str) -> Result<Wish, Error> {
    if let Ok(nv) = input.parse::<NV>() {
        known(client, &nv.name)?;
        return Ok(Wish::pinned(nv.name.clone(), &nv.version));
    }

    let name = input
        .parse()
        .map_err(|error: spec::InvalidNV| Error::InvalidNV(error))?;
    known(client, &name)?;

    Ok(Wish::any(name))
}

/// A removal wish for an installed package
pub fn remove_wish(client: &Client, input: &str) -> Result<Wish, Error> {
    let name: spec::Name = input
        .parse()
        .map_err(|error: spec::InvalidNV| Error::InvalidNV(error))?;

    if !client.installed()?.contains(&name) {
        return Err(Error::UnknownPackage(name.to_string()));
    }

    Ok(Wish::any(name))
}

fn known(client: &Client, name: &spec::Name) -> Result<(), Error> {
    if index::versions(&client.installation, name)?.is_empty() {
        return Err(Error::UnknownPackage(name.to_string()));
    }

    Ok(())
}

/// Resolve `request` and walk the candidate solutions.
///
/// Candidates print in order; destructive ones need the user's nod, the
/// first rejection moves on to the next candidate. `None` means a clean
/// no-op: no solution exists, nothing was left to do, or every candidate
/// was turned down.
pub fn select(client: &Client, request: &Request, yes: bool) -> Result<Option<Solution>, Error> {
    let installed = client.installed()?;
    let universe = index::universe(&client.installation, &installed)?;

    let solutions = solver::resolve(&universe, request)?;

    if solutions.is_empty() {
        println!("No solution found, aborting.");
        return Ok(None);
    }

    for (ordinal, solution) in solutions.iter().enumerate() {
        if solution.is_empty() {
            println!("Nothing to do.");
            return Ok(None);
        }

        println!("The following actions will be performed:");
        print!("{solution}");

        if !solution.is_destructive() {
            return Ok(Some(solution.clone()));
        }

        let question = if ordinal == 0 {
            "Continue ?"
        } else {
            "Continue ? (press [n] to try another solution)"
        };

        if confirm(question, yes)? {
            return Ok(Some(solution.clone()));
        }
    }

    Ok(None)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown package {0}")]
    UnknownPackage(String),
    #[error(transparent)]
    InvalidNV(spec::InvalidNV),
    #[error("client")]
    Client(#[from] super::Error),
    #[error("solver")]
    Solver(#[from] solver::Error),
    #[error("index")]
    Index(#[from] index::Error),
    #[error("io")]
    Io(#[from] std::io::Error),
}
