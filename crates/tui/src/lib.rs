// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::io::{self, BufRead, Write};

pub use self::reexport::*;

pub mod pretty;

const DEFAULT_TERM_SIZE: (u16, u16) = (80, 24);

/// Simple terminal constraints wrapping
pub struct TermSize {
    pub width: usize,
    pub height: usize,
}

/// Generate a sane-fallback TermSize
pub fn term_size() -> TermSize {
    let size = crossterm::terminal::size().unwrap_or(DEFAULT_TERM_SIZE);
    let mapped = if size.0 < 1 || size.1 < 1 {
        DEFAULT_TERM_SIZE
    } else {
        size
    };
    TermSize {
        width: mapped.0 as usize,
        height: mapped.1 as usize,
    }
}

/// Put a question to the user and read one line of input.
///
/// An empty line, `y` or `Y` accepts; any other answer declines.
pub fn ask_yes_no(question: &str) -> io::Result<bool> {
    print!("{question} ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;

    Ok(matches!(answer.trim(), "" | "y" | "Y"))
}

/// Standard styling & progress reporting used across lichen
mod reexport {
    pub use crossterm::style::Stylize;
    pub use indicatif::{ProgressBar, ProgressStyle};
}
