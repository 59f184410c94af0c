// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Bridge from the synchronous command flow to async I/O.
//!
//! Commands run to completion on the calling thread; the network and
//! subprocess work they kick off is driven by a single current-thread
//! runtime, started on first use and kept for the life of the process so
//! the shared HTTP connection pool stays on one reactor.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Drive `task` to completion on the process-wide runtime
pub fn block_on<F: Future>(task: F) -> F::Output {
    let runtime = RUNTIME.get_or_init(|| {
        Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime")
    });

    runtime.block_on(task)
}
