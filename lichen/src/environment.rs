// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Environment variable selecting the client root directory
pub const ROOT_ENV: &str = "LICHEN_ROOT";
/// Port assumed for opam scheme remotes that don't name one
pub const DEFAULT_PORT: u16 = 9999;
/// Marker rendered in the version column for packages not installed
pub const NOT_INSTALLED: &str = "--";
