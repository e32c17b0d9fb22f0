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

//! Device-side views of the FIFOs in device memory.
//!
//! On the device, the input FIFO is consumed (the device owns its read
//! pointer) and the output FIFO is produced (the device owns its write
//! pointer). The host owns the other pointer of each. A view never caches
//! either pointer: every operation loads them fresh, so the views can be
//! shared between tasklets as long as the tasklets serialize the operations
//! that move the owned pointer.

use wramfifo_common::{FifoGeometry, FifoHeader, FifoKind, FifoLayout, MemOps, Ring, RingError};

use crate::error::{DeviceError, Result};

/// Validate the header at `base` and return the layout of the FIFO there.
fn attach_layout<M>(mem: &M, base: u64, expected: FifoKind) -> Result<FifoLayout>
where
    M: MemOps<Error = RingError>,
{
    let header: FifoHeader = mem.read_val(base)?;
    let (found, geometry) = header.decode(base)?;
    crate::ensure!(found == expected, DeviceError::WrongKind { expected, found });
    log::debug!(
        "attached {} FIFO at {:#x}: {} slots of {} bytes",
        found,
        base,
        geometry.capacity(),
        geometry.data_size()
    );
    Ok(FifoLayout::from_base(base, geometry)?)
}

fn load_ring<M>(mem: &M, layout: &FifoLayout) -> Result<Ring>
where
    M: MemOps<Error = RingError>,
{
    let read_ptr = mem.load_acquire(layout.read_ptr_addr())?;
    let write_ptr = mem.load_acquire(layout.write_ptr_addr())?;
    Ok(Ring::from_parts(
        layout.geometry().ptr_size(),
        read_ptr,
        write_ptr,
    )?)
}

fn check_element(geometry: FifoGeometry, len: usize) -> Result<()> {
    let expected = geometry.data_size() as usize;
    crate::ensure!(len == expected, DeviceError::ElementSize { expected, got: len });
    Ok(())
}

/// Host-to-device FIFO as seen by the device.
#[derive(Debug, Clone)]
pub struct InputFifo<M> {
    mem: M,
    layout: FifoLayout,
}

impl<M> InputFifo<M>
where
    M: MemOps<Error = RingError>,
{
    /// Attach to the input FIFO whose header starts at `base`.
    pub fn attach(mem: M, base: u64) -> Result<Self> {
        let layout = attach_layout(&mem, base, FifoKind::Input)?;
        Ok(Self { mem, layout })
    }

    pub fn geometry(&self) -> FifoGeometry {
        self.layout.geometry()
    }

    /// Current pointer pair.
    pub fn ring(&self) -> Result<Ring> {
        load_ring(&self.mem, &self.layout)
    }

    pub fn len(&self) -> Result<u64> {
        Ok(self.ring()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.ring()?.is_empty())
    }

    /// Copy the oldest element into `dst` without consuming it.
    ///
    /// Returns `false` when the FIFO is empty, leaving `dst` untouched.
    pub fn peek_into(&self, dst: &mut [u8]) -> Result<bool> {
        check_element(self.geometry(), dst.len())?;
        let ring = self.ring()?;
        if ring.is_empty() {
            return Ok(false);
        }
        self.mem.read(self.layout.slot_addr(ring.read_ptr()), dst)?;
        Ok(true)
    }

    /// Release the oldest element back to the host.
    ///
    /// Fails with [`RingError::WouldBlock`] on an empty FIFO. Callers racing
    /// with other tasklets must hold the lock guarding this FIFO.
    pub fn pop(&self) -> Result<()> {
        let mut ring = self.ring()?;
        if ring.is_empty() {
            return Err(RingError::WouldBlock.into());
        }
        ring.advance_read();
        self.mem
            .store_release(self.layout.read_ptr_addr(), ring.read_ptr())?;
        log::trace!(
            "input FIFO {:#x}: read_ptr -> {}",
            self.layout.base(),
            ring.read_ptr()
        );
        Ok(())
    }

    /// Copy out and consume the oldest element in one step.
    pub fn pop_into(&self, dst: &mut [u8]) -> Result<bool> {
        if !self.peek_into(dst)? {
            return Ok(false);
        }
        self.pop()?;
        Ok(true)
    }
}

/// Device-to-host FIFO as seen by the device.
#[derive(Debug, Clone)]
pub struct OutputFifo<M> {
    mem: M,
    layout: FifoLayout,
}

impl<M> OutputFifo<M>
where
    M: MemOps<Error = RingError>,
{
    /// Attach to the output FIFO whose header starts at `base`.
    pub fn attach(mem: M, base: u64) -> Result<Self> {
        let layout = attach_layout(&mem, base, FifoKind::Output)?;
        Ok(Self { mem, layout })
    }

    pub fn geometry(&self) -> FifoGeometry {
        self.layout.geometry()
    }

    pub fn ring(&self) -> Result<Ring> {
        load_ring(&self.mem, &self.layout)
    }

    pub fn len(&self) -> Result<u64> {
        Ok(self.ring()?.len())
    }

    pub fn is_full(&self) -> Result<bool> {
        Ok(self.ring()?.is_full())
    }

    /// Append `src` if there is a free slot.
    ///
    /// The element bytes are written before the new write pointer is
    /// published. Fails with [`RingError::WouldBlock`] when the host has not
    /// yet drained a slot.
    pub fn try_push(&self, src: &[u8]) -> Result<()> {
        check_element(self.geometry(), src.len())?;
        let mut ring = self.ring()?;
        if ring.is_full() {
            return Err(RingError::WouldBlock.into());
        }
        self.mem.write(self.layout.slot_addr(ring.write_ptr()), src)?;
        ring.advance_write();
        self.mem
            .store_release(self.layout.write_ptr_addr(), ring.write_ptr())?;
        log::trace!(
            "output FIFO {:#x}: write_ptr -> {}",
            self.layout.base(),
            ring.write_ptr()
        );
        Ok(())
    }

    /// Append `src`, waiting for the host to free a slot.
    pub fn push(&self, src: &[u8]) -> Result<()> {
        let mut backoff = Backoff::new();
        loop {
            match self.try_push(src) {
                Err(DeviceError::Ring(RingError::WouldBlock)) => backoff.snooze(),
                other => return other,
            }
        }
    }
}

/// Bounded exponential spinning used while waiting on the other side of a
/// FIFO.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6;

    pub(crate) const fn new() -> Self {
        Self { step: 0 }
    }

    pub(crate) fn snooze(&mut self) {
        for _ in 0..1u32 << self.step {
            core::hint::spin_loop();
        }
        if self.step < Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    pub(crate) fn reset(&mut self) {
        self.step = 0;
    }
}
