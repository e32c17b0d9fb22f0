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
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub mod fifo;
pub mod flag;
pub mod image;
pub mod tasklet;

/// Barriers and mutexes shared by the tasklets of one device.
pub mod sync;

/// Strategies for draining the input FIFO into the output FIFO.
///
/// Both strategies share the same termination rule: a tasklet only leaves
/// once the active flag has been observed clear *and* the input FIFO was
/// empty when checked after that observation.
pub mod drain;

pub use drain::{
    Collective, CollectiveKernel, DrainMode, DrainStats, DrainStrategy, Exclusive, TaskletKernel,
};
pub use error::{DeviceError, Result};
pub use fifo::{InputFifo, OutputFifo};
pub use flag::{ActiveFlag, HostFlag};
pub use image::{DeviceImage, ImageBuilder};
pub use sync::{HwMutexes, MutexId, MutexPool, NR_HW_MUTEXES, TaskletBarrier, VirtualMutex};
pub use tasklet::{MAX_TASKLETS, TaskletId};
