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

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;

use crate::DATA_ALIGN;
use crate::ring::RingError;

/// Memory access for FIFO operations.
///
/// FIFO pointers are published with [`store_release`](Self::store_release)
/// and observed with [`load_acquire`](Self::load_acquire): everything written
/// before a pointer is published is visible to whoever observes the new
/// pointer value.
pub trait MemOps {
    type Error;

    /// Read bytes starting at `addr` into `dst`.
    fn read(&self, addr: u64, dst: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `src` starting at `addr`.
    fn write(&self, addr: u64, src: &[u8]) -> Result<usize, Self::Error>;

    /// Load a pointer word with acquire semantics.
    fn load_acquire(&self, addr: u64) -> Result<u64, Self::Error>;

    /// Store a pointer word with release semantics.
    fn store_release(&self, addr: u64, val: u64) -> Result<(), Self::Error>;

    /// Read a Pod type at the given address.
    fn read_val<T: Pod>(&self, addr: u64) -> Result<T, Self::Error> {
        let mut val = T::zeroed();
        let bytes = bytemuck::bytes_of_mut(&mut val);

        self.read(addr, bytes)?;
        Ok(val)
    }

    /// Write a Pod type at the given address.
    fn write_val<T: Pod>(&self, addr: u64, val: T) -> Result<(), Self::Error> {
        let bytes = bytemuck::bytes_of(&val);
        self.write(addr, bytes)?;
        Ok(())
    }
}

impl<M: MemOps + ?Sized> MemOps for &M {
    type Error = M::Error;

    fn read(&self, addr: u64, dst: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(addr, dst)
    }

    fn write(&self, addr: u64, src: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(addr, src)
    }

    fn load_acquire(&self, addr: u64) -> Result<u64, Self::Error> {
        (**self).load_acquire(addr)
    }

    fn store_release(&self, addr: u64, val: u64) -> Result<(), Self::Error> {
        (**self).store_release(addr, val)
    }
}

/// Word-addressed device memory.
///
/// Every access must be aligned to [`DATA_ALIGN`] in both address and length.
/// Each word is an atomic, so concurrent tasklets and block transfers never
/// race at the byte level; ordering between a payload and the pointer that
/// publishes it comes from the release/acquire pairs on every word.
#[derive(Debug)]
pub struct Wram {
    words: Box<[AtomicU64]>,
}

impl Wram {
    /// Default device memory size (64 KiB).
    pub const DEFAULT_SIZE: usize = 64 * 1024;

    /// Create a zeroed memory of `size` bytes, rounded up to a whole word.
    pub fn new(size: usize) -> Self {
        let nr_words = size.div_ceil(DATA_ALIGN);
        let words: Vec<AtomicU64> = (0..nr_words).map(|_| AtomicU64::new(0)).collect();
        Self {
            words: words.into_boxed_slice(),
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.words.len() * DATA_ALIGN
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word range covered by an access, after alignment and bounds checks.
    fn span(&self, addr: u64, len: usize) -> Result<core::ops::Range<usize>, RingError> {
        if addr % DATA_ALIGN as u64 != 0 || len % DATA_ALIGN != 0 {
            return Err(RingError::Misaligned(addr, len));
        }
        let start = usize::try_from(addr).map_err(|_| RingError::OutOfBounds(addr, len))? / DATA_ALIGN;
        match start.checked_add(len / DATA_ALIGN) {
            Some(end) if end <= self.words.len() => Ok(start..end),
            _ => Err(RingError::OutOfBounds(addr, len)),
        }
    }
}

impl MemOps for Wram {
    type Error = RingError;

    fn read(&self, addr: u64, dst: &mut [u8]) -> Result<usize, Self::Error> {
        let span = self.span(addr, dst.len())?;
        for (word, chunk) in self.words[span].iter().zip(dst.chunks_exact_mut(DATA_ALIGN)) {
            chunk.copy_from_slice(&word.load(Ordering::Acquire).to_le_bytes());
        }
        Ok(dst.len())
    }

    fn write(&self, addr: u64, src: &[u8]) -> Result<usize, Self::Error> {
        let span = self.span(addr, src.len())?;
        for (word, chunk) in self.words[span].iter().zip(src.chunks_exact(DATA_ALIGN)) {
            let mut bytes = [0u8; DATA_ALIGN];
            bytes.copy_from_slice(chunk);
            word.store(u64::from_le_bytes(bytes), Ordering::Release);
        }
        Ok(src.len())
    }

    fn load_acquire(&self, addr: u64) -> Result<u64, Self::Error> {
        let span = self.span(addr, DATA_ALIGN)?;
        Ok(self.words[span.start].load(Ordering::Acquire))
    }

    fn store_release(&self, addr: u64, val: u64) -> Result<(), Self::Error> {
        let span = self.span(addr, DATA_ALIGN)?;
        self.words[span.start].store(val, Ordering::Release);
        Ok(())
    }
}

impl Default for Wram {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}
