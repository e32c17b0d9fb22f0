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
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

/// Number of bytes every device memory access is aligned to. FIFO elements,
/// FIFO headers and block transfers are all expressed in multiples of this.
pub const DATA_ALIGN: usize = 8;

/// Maximum number of devices the host drives as one rank.
pub const MAX_DEVICES_PER_RANK: usize = 64;

/// Ring pointer arithmetic.
///
/// A ring is described by two absolute, monotonically increasing counters.
/// The side that produces into a ring owns its write pointer, the side that
/// consumes from it owns its read pointer, and neither side ever writes the
/// pointer it does not own. All of the full/empty/wrap logic lives here so
/// the host and the device agree on it bit for bit.
pub mod ring;

/// FIFO geometry and the layout of a FIFO symbol in device memory.
pub mod layout;

/// Memory access for device-resident FIFOs.
///
/// [`mem::MemOps`] abstracts the memory a FIFO lives in so that device code
/// can run against a real WRAM image and tests can run against an in-process
/// word store ([`mem::Wram`]).
pub mod mem;

/// Symbols of a loaded device program.
pub mod symbol;

pub use layout::{DEFAULT_PTR_SIZE, FifoGeometry, FifoHeader, FifoKind, FifoLayout, MAX_PTR_SIZE};
pub use mem::{MemOps, Wram};
pub use ring::{Ring, RingError};
pub use symbol::{Symbol, SymbolKind, SymbolTable};
