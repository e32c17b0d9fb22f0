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

//! Device images: the symbols of a device program laid out in a fresh
//! device memory.

use alloc::string::String;
use alloc::vec::Vec;

use wramfifo_common::{
    DATA_ALIGN, FifoGeometry, FifoHeader, FifoKind, FifoLayout, MemOps, Symbol, SymbolKind,
    SymbolTable, Wram,
};

use crate::error::{DeviceError, Result};
use crate::fifo::{InputFifo, OutputFifo};
use crate::flag::HostFlag;

/// Lays out FIFOs and host variables, in declaration order, starting at
/// address 0.
///
/// The builder only records the layout; [`build`](Self::build) can be called
/// once per device to get identical, independent images.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    size: usize,
    next: u64,
    symbols: Vec<(String, Symbol)>,
}

impl ImageBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.next_multiple_of(DATA_ALIGN),
            next: 0,
            symbols: Vec::new(),
        }
    }

    fn reserve(&mut self, name: &str, size: usize, kind: SymbolKind) -> Result<()> {
        crate::ensure!(
            !self.symbols.iter().any(|(n, _)| n == name),
            DeviceError::DuplicateSymbol(name.into())
        );
        let size = size.next_multiple_of(DATA_ALIGN);
        let full = DeviceError::ImageFull {
            offset: self.next,
            requested: size,
            available: self.size,
        };
        let end = (self.next as usize).checked_add(size).ok_or(full.clone())?;
        crate::ensure!(end <= self.size, full);

        self.symbols.push((
            name.into(),
            Symbol {
                address: self.next,
                size,
                kind,
            },
        ));
        self.next = end as u64;
        Ok(())
    }

    fn fifo(mut self, name: &str, kind: FifoKind, ptr_size: u32, data_size: u32) -> Result<Self> {
        let geometry = FifoGeometry::new(ptr_size, data_size)?;
        self.reserve(
            name,
            FifoLayout::query_size(geometry),
            SymbolKind::Fifo(kind, geometry),
        )?;
        Ok(self)
    }

    /// Declare a host-to-device FIFO.
    pub fn input_fifo(self, name: &str, ptr_size: u32, data_size: u32) -> Result<Self> {
        self.fifo(name, FifoKind::Input, ptr_size, data_size)
    }

    /// Declare a device-to-host FIFO.
    pub fn output_fifo(self, name: &str, ptr_size: u32, data_size: u32) -> Result<Self> {
        self.fifo(name, FifoKind::Output, ptr_size, data_size)
    }

    /// Declare a host-writable variable of `size` bytes, rounded up to a word.
    pub fn variable(mut self, name: &str, size: usize) -> Result<Self> {
        self.reserve(name, size, SymbolKind::Variable)?;
        Ok(self)
    }

    /// Bytes of device memory used so far.
    pub fn used(&self) -> usize {
        self.next as usize
    }

    pub fn symbols(&self) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (name, symbol) in &self.symbols {
            table.insert(name.as_str(), *symbol);
        }
        table
    }

    /// Create a device memory holding every declared symbol, with all FIFO
    /// headers initialized and every FIFO empty.
    pub fn build(&self) -> Result<DeviceImage> {
        let wram = Wram::new(self.size);
        for (name, symbol) in &self.symbols {
            if let SymbolKind::Fifo(kind, geometry) = symbol.kind {
                wram.write_val(symbol.address, FifoHeader::new(kind, geometry))?;
                log::debug!("{} FIFO {} at {:#x}", kind, name, symbol.address);
            }
        }
        Ok(DeviceImage {
            wram,
            symbols: self.symbols(),
        })
    }
}

/// One device's memory together with the symbols of the program it runs.
#[derive(Debug)]
pub struct DeviceImage {
    wram: Wram,
    symbols: SymbolTable,
}

impl DeviceImage {
    pub fn wram(&self) -> &Wram {
        &self.wram
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn symbol(&self, name: &str) -> Result<&Symbol> {
        self.symbols
            .get(name)
            .ok_or_else(|| DeviceError::NoSuchSymbol(name.into()))
    }

    fn fifo_base(&self, name: &str) -> Result<u64> {
        let symbol = self.symbol(name)?;
        match symbol.kind {
            SymbolKind::Fifo(..) => Ok(symbol.address),
            SymbolKind::Variable => Err(DeviceError::NotAFifo(name.into())),
        }
    }

    pub fn input_fifo(&self, name: &str) -> Result<InputFifo<&Wram>> {
        InputFifo::attach(&self.wram, self.fifo_base(name)?)
    }

    pub fn output_fifo(&self, name: &str) -> Result<OutputFifo<&Wram>> {
        OutputFifo::attach(&self.wram, self.fifo_base(name)?)
    }

    pub fn host_flag(&self, name: &str) -> Result<HostFlag<&Wram>> {
        HostFlag::attach(&self.wram, name, self.symbol(name)?)
    }
}
