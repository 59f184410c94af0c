// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Aligned row printing for the lichen CLI

use std::io::Write;

/// A `name  version  synopsis` line in an overview listing
pub struct Row {
    pub name: String,
    pub version: String,
    pub synopsis: String,
}

/// Print rows with names right-aligned to the widest name and versions
/// left-aligned in a column at least `version_floor` wide, so the synopsis
/// column starts at the same offset on every line.
pub fn print_rows(
    writer: &mut impl Write,
    rows: &[Row],
    version_floor: usize,
) -> std::io::Result<()> {
    let name_width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0);
    let version_width = rows
        .iter()
        .map(|row| row.version.len())
        .max()
        .unwrap_or(0)
        .max(version_floor);

    for row in rows {
        writeln!(
            writer,
            "{:>name_width$}  {:<version_width$}  {}",
            row.name, row.version, row.synopsis
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn columns_line_up() {
        let rows = vec![
            Row {
                name: "lwt".into(),
                version: "2.3.1".into(),
                synopsis: "Lightweight threads".into(),
            },
            Row {
                name: "ocamlfind".into(),
                version: "--".into(),
                synopsis: "Findlib".into(),
            },
        ];

        let mut out = Vec::new();
        print_rows(&mut out, &rows, 2).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "      lwt  2.3.1  Lightweight threads\n\
             ocamlfind  --     Findlib\n"
        );
    }
}
