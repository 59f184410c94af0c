// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

mod cli;

/// Main entry point
fn main() {
    env_logger::init();

    if let Err(error) = cli::process() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
