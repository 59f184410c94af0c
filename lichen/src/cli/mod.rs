// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};
use thiserror::Error;

use lichen::installation;

mod config;
mod info;
mod init;
mod install;
mod list;
mod remote;
mod remove;
mod update;
mod upgrade;
mod upload;
mod version;

/// Generate the CLI command structure
fn command() -> Command {
    Command::new("lichen")
        .about("Source based package manager")
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("root")
                .short('D')
                .long("directory")
                .global(true)
                .help("Client root directory (defaults to $LICHEN_ROOT)")
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes-all")
                .global(true)
                .help("Assume yes for all questions")
                .action(ArgAction::SetTrue),
        )
        .arg_required_else_help(true)
        .subcommand(config::command())
        .subcommand(info::command())
        .subcommand(init::command())
        .subcommand(install::command())
        .subcommand(list::command())
        .subcommand(remote::command())
        .subcommand(remove::command())
        .subcommand(update::command())
        .subcommand(upgrade::command())
        .subcommand(upload::command())
        .subcommand(version::command())
}

/// Process all CLI arguments
pub fn process() -> Result<(), Error> {
    let matches = command().get_matches();

    if matches.get_flag("version") {
        version::print();
        return Ok(());
    }

    if let Some(("version", _)) = matches.subcommand() {
        version::print();
        return Ok(());
    }

    let root = installation::resolve_root(matches.get_one::<PathBuf>("root").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("config", args)) => config::handle(args, &root).map_err(Error::Config),
        Some(("info", args)) => info::handle(args, &root).map_err(Error::Info),
        Some(("init", args)) => init::handle(args, &root).map_err(Error::Init),
        Some(("install", args)) => install::handle(args, &root).map_err(Error::Install),
        Some(("list", args)) => list::handle(args, &root).map_err(Error::List),
        Some(("remote", args)) => remote::handle(args, &root).map_err(Error::Remote),
        Some(("remove", args)) => remove::handle(args, &root).map_err(Error::Remove),
        Some(("update", args)) => update::handle(args, &root).map_err(Error::Update),
        Some(("upgrade", args)) => upgrade::handle(args, &root).map_err(Error::Upgrade),
        Some(("upload", args)) => upload::handle(args, &root).map_err(Error::Upload),
        _ => unreachable!(),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Root(#[from] installation::RootError),

    #[error("error handling config: {0}")]
    Config(#[source] config::Error),

    #[error("error handling info: {0}")]
    Info(#[source] info::Error),

    #[error("error handling init: {0}")]
    Init(#[source] init::Error),

    #[error("error handling install: {0}")]
    Install(#[source] install::Error),

    #[error("error handling list: {0}")]
    List(#[source] list::Error),

    #[error("error handling remote: {0}")]
    Remote(#[source] remote::Error),

    #[error("error handling remove: {0}")]
    Remove(#[source] remove::Error),

    #[error("error handling update: {0}")]
    Update(#[source] update::Error),

    #[error("error handling upgrade: {0}")]
    Upgrade(#[source] upgrade::Error),

    #[error("error handling upload: {0}")]
    Upload(#[source] upload::Error),
}
