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

//! Ring Pointer Arithmetic
//!
//! A ring of capacity `C = 1 << ptr_size` is tracked with two absolute
//! counters that only ever grow:
//!
//! ```text
//!   read_ptr                      write_ptr
//!      │                              │
//!      v                              v
//!  ... │ e[r] │ e[r+1] │ ... │ e[w-1] │ free ... │
//!
//!  slot of pointer p = p & (C - 1)
//!  len               = write_ptr - read_ptr      (always in 0..=C)
//! ```
//!
//! Because the counters are absolute, "masked positions equal" is ambiguous
//! on its own; the absolute values disambiguate it:
//!
//! - `read_ptr == write_ptr`: empty
//! - masked positions equal and `read_ptr != write_ptr`: full
//!
//! Differences are computed with wrapping arithmetic so that the protocol
//! keeps working if a counter ever wraps around `u64::MAX`.

use thiserror::Error;

use crate::layout::MAX_PTR_SIZE;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    #[error("Invalid pointer size {0}, must be at most 10")]
    InvalidPtrSize(u32),
    #[error("Invalid element size {0}, must be a strictly positive multiple of 8")]
    InvalidDataSize(u32),
    #[error("Address {0:#x} or length {1} is not 8 byte aligned")]
    Misaligned(u64, usize),
    #[error("Access at {0:#x} of {1} bytes is out of bounds")]
    OutOfBounds(u64, usize),
    #[error("FIFO header at {0:#x} is malformed")]
    BadHeader(u64),
    #[error("Operation would block")]
    WouldBlock,
}

/// Pointer state of one ring.
///
/// `Ring` is plain data: it never synchronizes anything by itself. Whoever
/// holds a `Ring` either owns the pointer it advances, or holds a shadow copy
/// of the remote pointer that it refreshes explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ring {
    read_ptr: u64,
    write_ptr: u64,
    ptr_size: u32,
}

impl Ring {
    /// Create an empty ring with `1 << ptr_size` slots.
    pub const fn new(ptr_size: u32) -> Result<Self, RingError> {
        Self::from_parts(ptr_size, 0, 0)
    }

    /// Create a ring from previously observed pointer values.
    pub const fn from_parts(ptr_size: u32, read_ptr: u64, write_ptr: u64) -> Result<Self, RingError> {
        if ptr_size > MAX_PTR_SIZE {
            return Err(RingError::InvalidPtrSize(ptr_size));
        }

        Ok(Self {
            read_ptr,
            write_ptr,
            ptr_size,
        })
    }

    /// Number of slots.
    #[inline]
    pub const fn capacity(&self) -> u64 {
        1 << self.ptr_size
    }

    #[inline]
    pub const fn ptr_size(&self) -> u32 {
        self.ptr_size
    }

    /// Slot index of an absolute pointer.
    #[inline]
    pub const fn element_index(&self, ptr: u64) -> u64 {
        ptr & (self.capacity() - 1)
    }

    #[inline]
    pub const fn read_ptr(&self) -> u64 {
        self.read_ptr
    }

    #[inline]
    pub const fn write_ptr(&self) -> u64 {
        self.write_ptr
    }

    #[inline]
    pub const fn masked_read(&self) -> u64 {
        self.element_index(self.read_ptr)
    }

    #[inline]
    pub const fn masked_write(&self) -> u64 {
        self.element_index(self.write_ptr)
    }

    /// Number of elements between the read and the write pointer.
    #[inline]
    pub const fn len(&self) -> u64 {
        self.write_ptr.wrapping_sub(self.read_ptr)
    }

    /// Number of slots the producer may still fill.
    #[inline]
    pub const fn free(&self) -> u64 {
        self.capacity().saturating_sub(self.len())
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.read_ptr == self.write_ptr
    }

    #[inline]
    pub const fn is_full(&self) -> bool {
        self.masked_read() == self.masked_write() && self.read_ptr != self.write_ptr
    }

    /// Advance the write pointer by one slot.
    ///
    /// The caller must have checked that the ring is not full.
    #[inline]
    pub fn advance_write(&mut self) {
        debug_assert!(!self.is_full(), "advance_write on a full ring");
        self.write_ptr = self.write_ptr.wrapping_add(1);
    }

    /// Advance the read pointer by one slot.
    ///
    /// The caller must have checked that the ring is not empty.
    #[inline]
    pub fn advance_read(&mut self) {
        debug_assert!(!self.is_empty(), "advance_read on an empty ring");
        self.read_ptr = self.read_ptr.wrapping_add(1);
    }

    /// Advance the read pointer by `n` slots, `n` must not exceed [`len`](Self::len).
    #[inline]
    pub fn advance_read_by(&mut self, n: u64) {
        debug_assert!(n <= self.len(), "advance_read_by past the write pointer");
        self.read_ptr = self.read_ptr.wrapping_add(n);
    }

    /// Record the latest observed value of the read pointer.
    #[inline]
    pub fn set_read_ptr(&mut self, ptr: u64) {
        self.read_ptr = ptr;
    }

    /// Record the latest observed value of the write pointer.
    #[inline]
    pub fn set_write_ptr(&mut self, ptr: u64) {
        self.write_ptr = ptr;
    }

    /// Exchange the read and the write pointer.
    ///
    /// Only meaningful while a ring is being (re)initialized, never on a ring
    /// that carries traffic.
    #[inline]
    pub fn swap_read_write(&mut self) {
        core::mem::swap(&mut self.read_ptr, &mut self.write_ptr);
    }

    /// Split `count` consecutive elements starting at absolute pointer `ptr`
    /// into the run that fits before the end of the buffer and the run that
    /// wraps to slot 0.
    #[inline]
    pub const fn wrap_split(&self, ptr: u64, count: u64) -> (u64, u64) {
        let until_end = self.capacity() - self.element_index(ptr);
        if count <= until_end {
            (count, 0)
        } else {
            (until_end, count - until_end)
        }
    }
}
