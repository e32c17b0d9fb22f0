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

//! Tasklets of one device share memory and coordinate only through the
//! primitives in this module:
//!
//! - [`TaskletBarrier`]: every participant blocks until all have arrived.
//! - [`HwMutexes`]: the device's bank of physical mutexes.
//! - [`MutexPool`]: many logical locks folded onto a few physical ones.
//! - [`VirtualMutex`]: many logical locks backed by lock bits, with the
//!   physical mutexes only guarding bit updates.

mod barrier;
mod mutex;
mod vmutex;

pub use barrier::TaskletBarrier;
pub use mutex::{HwMutexes, MutexId, MutexPool, NR_HW_MUTEXES};
pub use vmutex::{VirtualMutex, VirtualMutexGuard};
