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

use core::sync::atomic::{AtomicBool, Ordering};

use wramfifo_common::{MemOps, RingError, Symbol, SymbolKind};

use crate::error::{DeviceError, Result};

/// Advisory "keep draining" signal.
///
/// Tasklets only consult it between elements; clearing it never interrupts
/// an element that is already being processed.
pub trait ActiveFlag: Sync {
    fn is_active(&self) -> bool;
}

impl ActiveFlag for AtomicBool {
    fn is_active(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<F: ActiveFlag + ?Sized> ActiveFlag for &F {
    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

/// An active flag stored in a device memory word that the host writes.
///
/// Any non-zero value means active.
#[derive(Debug, Clone)]
pub struct HostFlag<M> {
    mem: M,
    addr: u64,
}

impl<M> HostFlag<M>
where
    M: MemOps<Error = RingError>,
{
    /// Attach to a host variable of at least one word.
    pub fn attach(mem: M, name: &str, symbol: &Symbol) -> Result<Self> {
        crate::ensure!(
            symbol.kind == SymbolKind::Variable && symbol.size >= 8,
            DeviceError::NotAVariable(name.into())
        );
        // Probe once so later loads can only fail if memory shrinks.
        mem.load_acquire(symbol.address)?;
        Ok(Self {
            mem,
            addr: symbol.address,
        })
    }
}

impl<M> ActiveFlag for HostFlag<M>
where
    M: MemOps<Error = RingError> + Sync,
{
    fn is_active(&self) -> bool {
        match self.mem.load_acquire(self.addr) {
            Ok(word) => word != 0,
            Err(e) => {
                log::error!("host flag at {:#x} unreadable: {}", self.addr, e);
                false
            }
        }
    }
}
