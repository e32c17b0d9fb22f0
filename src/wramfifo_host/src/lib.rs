/*
Copyright 2026 The wramfifo Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

#![cfg_attr(not(any(test, debug_assertions)), warn(clippy::panic))]
#![cfg_attr(not(any(test, debug_assertions)), warn(clippy::expect_used))]
#![cfg_attr(not(any(test, debug_assertions)), warn(clippy::unwrap_used))]

//! Host side of the WRAM FIFO protocol.
//!
//! A [`FifoLink`] binds one FIFO symbol on every device of a [`Rank`]. The
//! host owns the write pointer of input FIFOs and the read pointer of output
//! FIFOs; it keeps a shadow copy of both pointers per device, refreshes the
//! shadows with a single transfer before acting, and publishes its own
//! pointer only after the data it covers has been transferred.

/// Errors returned by links and ranks.
pub mod error;

/// Retry policy and expected element size of a link.
pub mod config;

/// Ranks of devices and the block transfers between host and devices.
pub mod rank;

/// FIFO links.
pub mod fifo;

pub use config::{Backoff, FifoConfig};
pub use error::{FifoError, Result};
pub use fifo::{FifoLink, PullResult, PushReport};
pub use rank::{LocalRank, Rank, TransferEntry, TransferMatrix};
