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

use std::thread;
use std::time::Duration;

use tracing::{Span, instrument};
use wramfifo_common::{FifoGeometry, FifoHeader, FifoKind, FifoLayout, Ring, SymbolKind};

use super::report::{PullResult, PushReport};
use crate::config::{Backoff, FifoConfig};
use crate::error::FifoError;
use crate::rank::{Rank, TransferMatrix};
use crate::Result;

/// Bytes of the read/write pointer pair at the start of every FIFO header.
const POINTER_PAIR: usize = 16;

/// One FIFO symbol linked on every device of a rank.
///
/// The link holds a shadow [`Ring`] per device. Shadows are refreshed from
/// the devices with one transfer before every push and pull, and the host
/// only ever publishes the pointer it owns: the write pointer of an input
/// FIFO, the read pointer of an output FIFO.
#[derive(Debug)]
pub struct FifoLink<'r, R: Rank + ?Sized> {
    rank: &'r R,
    name: String,
    kind: FifoKind,
    layout: FifoLayout,
    rings: Vec<Ring>,
    /// Set when a transfer failed part way and the shadows may not match
    /// the devices.
    stale: bool,
    config: FifoConfig,
}

impl<'r, R: Rank + ?Sized> FifoLink<'r, R> {
    /// Link the host-to-device FIFO `name`.
    pub fn link_input(rank: &'r R, name: &str, config: FifoConfig) -> Result<Self> {
        Self::link(rank, name, FifoKind::Input, config)
    }

    /// Link the device-to-host FIFO `name`.
    pub fn link_output(rank: &'r R, name: &str, config: FifoConfig) -> Result<Self> {
        Self::link(rank, name, FifoKind::Output, config)
    }

    #[instrument(err(Debug), skip(rank, config), parent = Span::current(), level = "Trace")]
    fn link(rank: &'r R, name: &str, kind: FifoKind, config: FifoConfig) -> Result<Self> {
        let symbol = rank
            .symbols()
            .get(name)
            .ok_or_else(|| FifoError::SymbolNotFound(name.into()))?;
        let (found, geometry) = match symbol.kind {
            SymbolKind::Fifo(found, geometry) => (found, geometry),
            SymbolKind::Variable => return Err(FifoError::NotAFifo(name.into())),
        };
        if found != kind {
            return Err(FifoError::WrongDirection {
                name: name.into(),
                requested: kind,
                found,
            });
        }
        if let Some(configured) = config.data_size() {
            if configured != geometry.data_size() {
                return Err(FifoError::SizeMismatch {
                    name: name.into(),
                    declared: geometry.data_size(),
                    configured,
                });
            }
        }
        let layout = FifoLayout::from_base(symbol.address, geometry)
            .map_err(FifoError::InvalidConfiguration)?;

        let mut link = Self {
            rank,
            name: name.into(),
            kind,
            layout,
            rings: vec![geometry.ring(); rank.nr_devices()],
            stale: true,
            config,
        };
        link.check_headers()?;
        link.refresh()?;
        tracing::debug!(
            "linked {} FIFO {} on {} devices: {} slots of {} bytes",
            kind,
            name,
            link.nr_devices(),
            geometry.capacity(),
            geometry.data_size()
        );
        Ok(link)
    }

    /// Every device must carry the header the symbol table declares.
    fn check_headers(&self) -> Result<()> {
        let mut headers = vec![[0u8; FifoHeader::SIZE]; self.nr_devices()];
        let mut matrix = TransferMatrix::with_capacity(headers.len());
        for (device, buf) in headers.iter_mut().enumerate() {
            matrix.push(device, self.layout.base(), &mut buf[..]);
        }
        self.rank.copy_from_devices(&mut matrix)?;

        for (device, bytes) in headers.iter().enumerate() {
            let header: FifoHeader = bytemuck::pod_read_unaligned(bytes);
            let decoded = header
                .decode(self.layout.base())
                .map_err(FifoError::InvalidConfiguration)?;
            if decoded != (self.kind, self.geometry()) {
                return Err(crate::new_error!(
                    "device {} holds a different FIFO at {:#x} than symbol {}",
                    device,
                    self.layout.base(),
                    self.name
                ));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FifoKind {
        self.kind
    }

    pub fn geometry(&self) -> FifoGeometry {
        self.layout.geometry()
    }

    pub fn config(&self) -> &FifoConfig {
        &self.config
    }

    pub fn nr_devices(&self) -> usize {
        self.rings.len()
    }

    /// Whether the pointer shadows may disagree with the devices. The next
    /// push, pull or [`refresh`](Self::refresh) clears this.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn set_max_retries(&mut self, max_retries: u32) {
        self.config.set_max_retries(max_retries);
    }

    pub fn set_retry_delay(&mut self, retry_delay: Duration) {
        self.config.set_retry_delay(retry_delay);
    }

    pub fn set_backoff(&mut self, backoff: Backoff) {
        self.config.set_backoff(backoff);
    }

    fn ring(&self, device: usize) -> Result<&Ring> {
        self.rings.get(device).ok_or(FifoError::NoSuchDevice(device))
    }

    /// Number of slots of the FIFO on `device`.
    pub fn ring_size(&self, device: usize) -> Result<u64> {
        Ok(self.ring(device)?.capacity())
    }

    /// Largest FIFO over all devices of the rank.
    pub fn max_ring_size(&self) -> u64 {
        self.rings.iter().map(Ring::capacity).max().unwrap_or(0)
    }

    /// Elements in the FIFO on `device` as of the last refresh.
    pub fn available_elements(&self, device: usize) -> Result<u64> {
        Ok(self.ring(device)?.len())
    }

    pub fn read_ptr(&self, device: usize) -> Result<u64> {
        Ok(self.ring(device)?.read_ptr())
    }

    pub fn write_ptr(&self, device: usize) -> Result<u64> {
        Ok(self.ring(device)?.write_ptr())
    }

    pub fn masked_read_ptr(&self, device: usize) -> Result<u64> {
        Ok(self.ring(device)?.masked_read())
    }

    pub fn masked_write_ptr(&self, device: usize) -> Result<u64> {
        Ok(self.ring(device)?.masked_write())
    }

    /// Slot holding the `index`-th oldest element of the FIFO on `device`.
    pub fn element_index(&self, device: usize, index: u64) -> Result<u64> {
        let ring = self.ring(device)?;
        Ok(ring.element_index(ring.read_ptr().wrapping_add(index)))
    }

    /// Re-read the pointer pair of every device.
    pub fn refresh(&mut self) -> Result<()> {
        let all: Vec<usize> = (0..self.nr_devices()).collect();
        self.refresh_devices(&all)
    }

    /// Re-read the pointer pair of `devices` with a single transfer.
    fn refresh_devices(&mut self, devices: &[usize]) -> Result<()> {
        let mut pairs = vec![[0u8; POINTER_PAIR]; devices.len()];
        let mut matrix = TransferMatrix::with_capacity(devices.len());
        for (&device, buf) in devices.iter().zip(pairs.iter_mut()) {
            matrix.push(device, self.layout.read_ptr_addr(), &mut buf[..]);
        }
        if let Err(e) = self.rank.copy_from_devices(&mut matrix) {
            self.stale = true;
            return Err(e);
        }

        let ptr_size = self.geometry().ptr_size();
        for (&device, pair) in devices.iter().zip(pairs.iter()) {
            let [read, write]: [u64; 2] = bytemuck::pod_read_unaligned(pair);
            let (read_ptr, write_ptr) = (u64::from_le(read), u64::from_le(write));
            let ring = Ring::from_parts(ptr_size, read_ptr, write_ptr)
                .map_err(FifoError::InvalidConfiguration)?;
            if ring.len() > ring.capacity() {
                self.stale = true;
                return Err(FifoError::CorruptPointers {
                    device,
                    read_ptr,
                    write_ptr,
                });
            }
            self.rings[device] = ring;
        }
        if devices.len() == self.nr_devices() {
            self.stale = false;
        }
        Ok(())
    }

    /// Publish the host-owned pointer of `devices` from the shadows.
    fn publish_pointers(&mut self, devices: &[usize]) -> Result<()> {
        let (addr, words): (u64, Vec<[u8; 8]>) = match self.kind {
            FifoKind::Input => (
                self.layout.write_ptr_addr(),
                devices
                    .iter()
                    .map(|&d| self.rings[d].write_ptr().to_le_bytes())
                    .collect(),
            ),
            FifoKind::Output => (
                self.layout.read_ptr_addr(),
                devices
                    .iter()
                    .map(|&d| self.rings[d].read_ptr().to_le_bytes())
                    .collect(),
            ),
        };
        let mut matrix = TransferMatrix::with_capacity(devices.len());
        for (&device, word) in devices.iter().zip(words.iter()) {
            matrix.push(device, addr, &word[..]);
        }
        self.rank.copy_to_devices(&matrix).inspect_err(|_| {
            self.stale = true;
        })
    }

    /// Write one element into the next slot of every device in `ready`,
    /// then publish their new write pointers.
    fn stage<T: AsRef<[u8]>>(&mut self, ready: &[usize], inputs: &[T]) -> Result<()> {
        let mut matrix = TransferMatrix::with_capacity(ready.len());
        for &device in ready {
            let slot = self.layout.slot_addr(self.rings[device].write_ptr());
            matrix.push(device, slot, inputs[device].as_ref());
        }
        if let Err(e) = self.rank.copy_to_devices(&matrix) {
            self.stale = true;
            return Err(e);
        }

        for &device in ready {
            self.rings[device].advance_write();
        }
        self.publish_pointers(ready)
    }

    /// Push `inputs[d]` into the FIFO of device `d`, for every device.
    ///
    /// Devices whose FIFO is full are retried, after a wait, up to the
    /// configured number of times; only those devices are refreshed between
    /// retries. A device still full after that is reported in
    /// [`PushReport::failed`]. A transfer failure aborts the push: some
    /// devices may have received their element, and the link must be
    /// refreshed before the outcome is known.
    #[instrument(err(Debug), skip_all, parent = Span::current(), level = "Trace")]
    pub fn push<T: AsRef<[u8]>>(&mut self, inputs: &[T]) -> Result<PushReport> {
        if self.kind != FifoKind::Input {
            return Err(FifoError::WrongDirection {
                name: self.name.clone(),
                requested: FifoKind::Input,
                found: self.kind,
            });
        }
        if inputs.len() != self.nr_devices() {
            return Err(FifoError::InputCountMismatch {
                expected: self.nr_devices(),
                got: inputs.len(),
            });
        }
        let expected = self.geometry().data_size() as usize;
        if let Some((device, input)) = inputs
            .iter()
            .enumerate()
            .find(|(_, i)| i.as_ref().len() != expected)
        {
            return Err(FifoError::ElementSize {
                device,
                expected,
                got: input.as_ref().len(),
            });
        }

        self.refresh()?;
        let mut pushed = Vec::with_capacity(inputs.len());
        let mut pending: Vec<usize> = (0..self.nr_devices()).collect();
        let mut attempt = 0;
        loop {
            let (ready, full): (Vec<usize>, Vec<usize>) =
                pending.iter().partition(|&&d| !self.rings[d].is_full());
            if !ready.is_empty() {
                self.stage(&ready, inputs)?;
                pushed.extend_from_slice(&ready);
            }
            pending = full;
            if pending.is_empty() || attempt == self.config.max_retries() {
                break;
            }

            let delay = self.config.delay_for(attempt);
            tracing::debug!(
                "{} input FIFOs of {} full, retry {} in {:?}",
                pending.len(),
                self.name,
                attempt + 1,
                delay
            );
            thread::sleep(delay);
            attempt += 1;
            self.refresh_devices(&pending)?;
        }

        let retries = self.config.max_retries();
        let failed = pending
            .into_iter()
            .map(|device| {
                tracing::warn!(
                    "input FIFO {} of device {} still full after {} retries",
                    self.name,
                    device,
                    retries
                );
                (device, FifoError::PushExhaustedRetries { device, retries })
            })
            .collect();
        pushed.sort_unstable();
        Ok(PushReport {
            pushed,
            failed,
            retries: attempt,
        })
    }

    /// Take every element currently in the FIFO of every device.
    ///
    /// Elements are copied with at most two transfers per device, one up to
    /// the end of the slot array and one for the part that wrapped around,
    /// and the slots are handed back to the devices afterwards.
    #[instrument(err(Debug), skip_all, parent = Span::current(), level = "Trace")]
    pub fn pull(&mut self) -> Result<PullResult> {
        if self.kind != FifoKind::Output {
            return Err(FifoError::WrongDirection {
                name: self.name.clone(),
                requested: FifoKind::Output,
                found: self.kind,
            });
        }
        self.refresh()?;

        let data_size = self.geometry().data_size() as usize;
        let mut devices: Vec<Vec<u8>> = self
            .rings
            .iter()
            .map(|ring| vec![0u8; ring.len() as usize * data_size])
            .collect();

        let mut matrix = TransferMatrix::with_capacity(2 * devices.len());
        for (device, (ring, buf)) in self.rings.iter().zip(devices.iter_mut()).enumerate() {
            if ring.is_empty() {
                continue;
            }
            let (first, _) = ring.wrap_split(ring.read_ptr(), ring.len());
            let (head, tail) = buf.split_at_mut(first as usize * data_size);
            matrix.push(device, self.layout.slot_addr(ring.read_ptr()), head);
            if !tail.is_empty() {
                matrix.push(device, self.layout.data_addr(), tail);
            }
        }
        if let Err(e) = self.rank.copy_from_devices(&mut matrix) {
            self.stale = true;
            return Err(e);
        }

        let drained: Vec<usize> = (0..self.nr_devices())
            .filter(|&d| !self.rings[d].is_empty())
            .collect();
        for &device in &drained {
            let len = self.rings[device].len();
            self.rings[device].advance_read_by(len);
        }
        if !drained.is_empty() {
            self.publish_pointers(&drained)?;
        }

        let result = PullResult { data_size, devices };
        tracing::trace!("pulled {} elements from {}", result.total(), self.name);
        Ok(result)
    }

    /// Release the link. Device memory is left as it is.
    pub fn free(self) {
        tracing::debug!("freeing FIFO link {}", self.name);
    }
}
