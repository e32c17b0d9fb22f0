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

use tracing::{Span, instrument};
use wramfifo_common::{MAX_DEVICES_PER_RANK, MemOps, RingError, SymbolKind, SymbolTable, Wram};
use wramfifo_device::{DeviceImage, ImageBuilder};

use super::{Rank, TransferMatrix};
use crate::error::FifoError;
use crate::{Result, new_error};

fn transfer_failure(device: usize, e: RingError) -> FifoError {
    FifoError::TransferFailure {
        device,
        reason: e.to_string(),
    }
}

/// A rank whose devices live in host memory.
///
/// Every device gets its own image of the same program. Tasklets are run by
/// the caller on threads of its own, against [`LocalRank::device`].
#[derive(Debug)]
pub struct LocalRank {
    devices: Vec<DeviceImage>,
    symbols: SymbolTable,
}

impl LocalRank {
    #[instrument(err(Debug), skip_all, parent = Span::current(), level = "Trace")]
    pub fn new(program: &ImageBuilder, nr_devices: usize) -> Result<Self> {
        if !(1..=MAX_DEVICES_PER_RANK).contains(&nr_devices) {
            return Err(new_error!(
                "A rank holds 1 to {} devices, {} requested",
                MAX_DEVICES_PER_RANK,
                nr_devices
            ));
        }
        let devices = (0..nr_devices)
            .map(|_| program.build())
            .collect::<core::result::Result<Vec<_>, _>>()?;
        tracing::debug!(nr_devices, bytes = program.used(), "local rank loaded");
        Ok(Self {
            devices,
            symbols: program.symbols(),
        })
    }

    pub fn device(&self, device: usize) -> Result<&DeviceImage> {
        self.devices
            .get(device)
            .ok_or(FifoError::NoSuchDevice(device))
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceImage> {
        self.devices.iter()
    }

    fn wram(&self, device: usize) -> Result<&Wram> {
        Ok(self.device(device)?.wram())
    }

    /// Write a one-word host variable on every device.
    pub fn write_variable(&self, name: &str, value: u64) -> Result<()> {
        let symbol = self
            .symbols
            .get(name)
            .ok_or_else(|| FifoError::SymbolNotFound(name.into()))?;
        if symbol.kind != SymbolKind::Variable || symbol.size < 8 {
            return Err(new_error!("{} is not a one-word variable", name));
        }
        for (device, image) in self.devices.iter().enumerate() {
            image
                .wram()
                .store_release(symbol.address, value)
                .map_err(|e| transfer_failure(device, e))?;
        }
        Ok(())
    }
}

impl Rank for LocalRank {
    fn nr_devices(&self) -> usize {
        self.devices.len()
    }

    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn copy_to_devices(&self, matrix: &TransferMatrix<&[u8]>) -> Result<()> {
        for entry in matrix.entries() {
            self.wram(entry.device)?
                .write(entry.offset, entry.buf)
                .map_err(|e| transfer_failure(entry.device, e))?;
        }
        Ok(())
    }

    fn copy_from_devices(&self, matrix: &mut TransferMatrix<&mut [u8]>) -> Result<()> {
        for entry in matrix.entries_mut() {
            self.wram(entry.device)?
                .read(entry.offset, &mut *entry.buf)
                .map_err(|e| transfer_failure(entry.device, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wramfifo_device::ActiveFlag;

    use super::*;

    fn program() -> ImageBuilder {
        ImageBuilder::new(512)
            .variable("active", 8)
            .unwrap()
            .input_fifo("in", 2, 8)
            .unwrap()
    }

    #[test]
    fn test_device_count_bounds() {
        assert!(LocalRank::new(&program(), 0).is_err());
        assert!(LocalRank::new(&program(), MAX_DEVICES_PER_RANK + 1).is_err());
        let rank = LocalRank::new(&program(), 4).unwrap();
        assert_eq!(rank.nr_devices(), 4);
        assert!(rank.symbols().contains("in"));
        assert_eq!(rank.device(4).unwrap_err(), FifoError::NoSuchDevice(4));
    }

    #[test]
    fn test_transfers_target_one_device() {
        let rank = LocalRank::new(&program(), 3).unwrap();
        let payload = [7u8; 16];
        let mut matrix: TransferMatrix<&[u8]> = TransferMatrix::new();
        matrix.push(1, 0x40, &payload);
        rank.copy_to_devices(&matrix).unwrap();

        let mut back = [[0u8; 16]; 3];
        let mut matrix = TransferMatrix::new();
        for (d, buf) in back.iter_mut().enumerate() {
            matrix.push(d, 0x40, &mut buf[..]);
        }
        rank.copy_from_devices(&mut matrix).unwrap();
        assert_eq!(back, [[0u8; 16], [7u8; 16], [0u8; 16]]);
    }

    #[test]
    fn test_bad_transfers_fail() {
        let rank = LocalRank::new(&program(), 1).unwrap();
        let mut matrix: TransferMatrix<&[u8]> = TransferMatrix::new();
        matrix.push(0, 0x4, &[0u8; 8]);
        assert!(matches!(
            rank.copy_to_devices(&matrix),
            Err(FifoError::TransferFailure { device: 0, .. })
        ));

        let mut matrix: TransferMatrix<&[u8]> = TransferMatrix::new();
        matrix.push(2, 0, &[0u8; 8]);
        assert_eq!(
            rank.copy_to_devices(&matrix),
            Err(FifoError::NoSuchDevice(2))
        );
    }

    #[test]
    fn test_write_variable() {
        let rank = LocalRank::new(&program(), 2).unwrap();
        rank.write_variable("active", 1).unwrap();
        for image in rank.devices() {
            assert!(image.host_flag("active").unwrap().is_active());
        }
        assert!(rank.write_variable("in", 1).is_err());
        assert_eq!(
            rank.write_variable("nope", 1),
            Err(FifoError::SymbolNotFound("nope".into()))
        );
    }
}
