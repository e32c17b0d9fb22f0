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

//! A FIFO symbol in device memory is a fixed header followed by the slot
//! array:
//!
//! ```text
//! base + 0   read_ptr   u64   owned by the consumer of this direction
//! base + 8   write_ptr  u64   owned by the producer of this direction
//! base + 16  ptr_size   u32   \
//! base + 20  data_size  u32    } static, written when the image is built
//! base + 24  kind       u64   /
//! base + 32  slots      (1 << ptr_size) * data_size bytes
//! ```
//!
//! Both pointers sit in their own 8-byte word so that each side can publish
//! its pointer with a single aligned transfer without touching the other.

use bytemuck::{Pod, Zeroable};

use crate::DATA_ALIGN;
use crate::ring::{Ring, RingError};

/// Largest supported pointer size in bits (1024 slots).
pub const MAX_PTR_SIZE: u32 = 10;

/// Pointer size used when none is requested (128 slots).
pub const DEFAULT_PTR_SIZE: u32 = 7;

/// Direction of a FIFO, seen from the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FifoKind {
    /// Host produces, device consumes.
    Input,
    /// Device produces, host consumes.
    Output,
}

impl FifoKind {
    const INPUT_TAG: u64 = 0x4946_4946_4f4e_4931; // "IFIFONI1"
    const OUTPUT_TAG: u64 = 0x4f46_4946_4f4e_4f31;

    pub const fn tag(self) -> u64 {
        match self {
            FifoKind::Input => Self::INPUT_TAG,
            FifoKind::Output => Self::OUTPUT_TAG,
        }
    }

    pub const fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            Self::INPUT_TAG => Some(FifoKind::Input),
            Self::OUTPUT_TAG => Some(FifoKind::Output),
            _ => None,
        }
    }
}

impl core::fmt::Display for FifoKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FifoKind::Input => f.write_str("input"),
            FifoKind::Output => f.write_str("output"),
        }
    }
}

/// Validated shape of a FIFO: slot count and element size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FifoGeometry {
    ptr_size: u32,
    data_size: u32,
}

impl FifoGeometry {
    /// `ptr_size` must be at most [`MAX_PTR_SIZE`] and `data_size` a strictly
    /// positive multiple of [`DATA_ALIGN`].
    pub const fn new(ptr_size: u32, data_size: u32) -> Result<Self, RingError> {
        if ptr_size > MAX_PTR_SIZE {
            return Err(RingError::InvalidPtrSize(ptr_size));
        }
        if data_size == 0 || data_size as usize % DATA_ALIGN != 0 {
            return Err(RingError::InvalidDataSize(data_size));
        }
        Ok(Self {
            ptr_size,
            data_size,
        })
    }

    #[inline]
    pub const fn ptr_size(&self) -> u32 {
        self.ptr_size
    }

    /// Size of one element in bytes.
    #[inline]
    pub const fn data_size(&self) -> u32 {
        self.data_size
    }

    #[inline]
    pub const fn capacity(&self) -> u64 {
        1 << self.ptr_size
    }

    /// Size of the slot array in bytes.
    #[inline]
    pub const fn data_len(&self) -> usize {
        self.capacity() as usize * self.data_size as usize
    }

    /// An empty ring of this shape.
    #[inline]
    pub const fn ring(&self) -> Ring {
        match Ring::new(self.ptr_size) {
            Ok(ring) => ring,
            // ptr_size was validated in `new`
            Err(_) => unreachable!(),
        }
    }
}

/// Header of a FIFO symbol exactly as it sits in device memory.
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
#[repr(C)]
pub struct FifoHeader {
    pub read_ptr: u64,
    pub write_ptr: u64,
    pub ptr_size: u32,
    pub data_size: u32,
    pub kind: u64,
}

impl FifoHeader {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Header of a freshly initialized FIFO.
    pub const fn new(kind: FifoKind, geometry: FifoGeometry) -> Self {
        Self {
            read_ptr: 0,
            write_ptr: 0,
            ptr_size: geometry.ptr_size,
            data_size: geometry.data_size,
            kind: kind.tag(),
        }
    }

    /// Decode kind and geometry, rejecting anything that was not written by
    /// [`FifoHeader::new`].
    pub fn decode(&self, base: u64) -> Result<(FifoKind, FifoGeometry), RingError> {
        let kind = FifoKind::from_tag(self.kind).ok_or(RingError::BadHeader(base))?;
        let geometry = FifoGeometry::new(self.ptr_size, self.data_size)?;
        Ok((kind, geometry))
    }
}

/// Addresses of the fields and slots of one FIFO symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FifoLayout {
    base: u64,
    geometry: FifoGeometry,
}

impl FifoLayout {
    const READ_PTR_OFFSET: u64 = 0;
    const WRITE_PTR_OFFSET: u64 = 8;

    /// Create a layout for a FIFO whose header starts at `base`.
    pub const fn from_base(base: u64, geometry: FifoGeometry) -> Result<Self, RingError> {
        if base % DATA_ALIGN as u64 != 0 {
            return Err(RingError::Misaligned(base, 0));
        }
        Ok(Self { base, geometry })
    }

    /// Total bytes a FIFO of this geometry occupies in device memory.
    pub const fn query_size(geometry: FifoGeometry) -> usize {
        FifoHeader::SIZE + geometry.data_len()
    }

    #[inline]
    pub const fn base(&self) -> u64 {
        self.base
    }

    #[inline]
    pub const fn geometry(&self) -> FifoGeometry {
        self.geometry
    }

    #[inline]
    pub const fn read_ptr_addr(&self) -> u64 {
        self.base + Self::READ_PTR_OFFSET
    }

    #[inline]
    pub const fn write_ptr_addr(&self) -> u64 {
        self.base + Self::WRITE_PTR_OFFSET
    }

    /// First byte of slot 0.
    #[inline]
    pub const fn data_addr(&self) -> u64 {
        self.base + FifoHeader::SIZE as u64
    }

    /// First byte of the slot holding absolute pointer `ptr`.
    #[inline]
    pub const fn slot_addr(&self, ptr: u64) -> u64 {
        let index = ptr & (self.geometry.capacity() - 1);
        self.data_addr() + index * self.geometry.data_size as u64
    }
}
