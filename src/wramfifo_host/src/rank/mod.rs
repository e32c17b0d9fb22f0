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

use wramfifo_common::SymbolTable;

use crate::Result;

mod local;
mod transfer;

pub use local::LocalRank;
pub use transfer::{TransferEntry, TransferMatrix};

/// A group of devices running the same program, driven as one unit.
///
/// Transfers are atomic per entry but not across a matrix: when a transfer
/// fails, any subset of the other entries may have completed.
pub trait Rank {
    fn nr_devices(&self) -> usize;

    /// Symbols of the program loaded on every device.
    fn symbols(&self) -> &SymbolTable;

    /// Copy every entry's buffer to its device at its offset.
    fn copy_to_devices(&self, matrix: &TransferMatrix<&[u8]>) -> Result<()>;

    /// Fill every entry's buffer from its device at its offset.
    fn copy_from_devices(&self, matrix: &mut TransferMatrix<&mut [u8]>) -> Result<()>;
}

impl<R: Rank + ?Sized> Rank for &R {
    fn nr_devices(&self) -> usize {
        (**self).nr_devices()
    }

    fn symbols(&self) -> &SymbolTable {
        (**self).symbols()
    }

    fn copy_to_devices(&self, matrix: &TransferMatrix<&[u8]>) -> Result<()> {
        (**self).copy_to_devices(matrix)
    }

    fn copy_from_devices(&self, matrix: &mut TransferMatrix<&mut [u8]>) -> Result<()> {
        (**self).copy_from_devices(matrix)
    }
}
