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

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use wramfifo_common::SymbolTable;
use wramfifo_device::ImageBuilder;
use wramfifo_host::{FifoError, LocalRank, Rank, Result, TransferMatrix};

/// A program with an input FIFO `in`, an output FIFO `out` and an `active`
/// host variable.
pub fn program(in_ptr_size: u32, out_ptr_size: u32, data_size: u32) -> ImageBuilder {
    ImageBuilder::new(16 * 1024)
        .variable("active", 8)
        .unwrap()
        .input_fifo("in", in_ptr_size, data_size)
        .unwrap()
        .output_fifo("out", out_ptr_size, data_size)
        .unwrap()
}

pub fn element(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

pub fn value(element: &[u8]) -> u64 {
    u64::from_le_bytes(element.try_into().unwrap())
}

/// Wraps a rank, counting transfers and failing a chosen one.
pub struct InstrumentedRank<'a> {
    pub inner: &'a LocalRank,
    /// Number of entries of every device-to-host matrix, in call order.
    pub reads: RefCell<Vec<usize>>,
    pub writes: Cell<usize>,
    /// Fail the host-to-device transfer with this (1-based) number.
    pub fail_write: Cell<Option<usize>>,
    /// Fail the device-to-host transfer with this (1-based) number.
    pub fail_read: Cell<Option<usize>>,
}

impl<'a> InstrumentedRank<'a> {
    pub fn new(inner: &'a LocalRank) -> Self {
        Self {
            inner,
            reads: RefCell::new(Vec::new()),
            writes: Cell::new(0),
            fail_write: Cell::new(None),
            fail_read: Cell::new(None),
        }
    }

    pub fn nr_reads(&self) -> usize {
        self.reads.borrow().len()
    }

    pub fn reset(&self) {
        self.reads.borrow_mut().clear();
        self.writes.set(0);
    }
}

impl Rank for InstrumentedRank<'_> {
    fn nr_devices(&self) -> usize {
        self.inner.nr_devices()
    }

    fn symbols(&self) -> &SymbolTable {
        self.inner.symbols()
    }

    fn copy_to_devices(&self, matrix: &TransferMatrix<&[u8]>) -> Result<()> {
        let n = self.writes.get() + 1;
        self.writes.set(n);
        if self.fail_write.get() == Some(n) {
            return Err(FifoError::TransferFailure {
                device: matrix.entries()[0].device,
                reason: "injected".into(),
            });
        }
        self.inner.copy_to_devices(matrix)
    }

    fn copy_from_devices(&self, matrix: &mut TransferMatrix<&mut [u8]>) -> Result<()> {
        self.reads.borrow_mut().push(matrix.len());
        if self.fail_read.get() == Some(self.nr_reads()) {
            return Err(FifoError::TransferFailure {
                device: matrix.entries()[0].device,
                reason: "injected".into(),
            });
        }
        self.inner.copy_from_devices(matrix)
    }
}
