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

use std::cmp::min;
use std::time::Duration;

use tracing::{Span, instrument};
use wramfifo_common::FifoGeometry;

use crate::Result;
use crate::error::FifoError;

/// How the wait between push retries evolves.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Backoff {
    /// Wait `retry_delay` before every retry.
    #[default]
    Fixed,
    /// Double the wait after every retry, starting at `retry_delay` and
    /// capped at `max`.
    Exponential { max: Duration },
}

/// Configuration of one FIFO link.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FifoConfig {
    /// Number of retries of a push into a full input FIFO before the device
    /// is reported as failed. Pulls never retry.
    max_retries: u32,
    /// Wait before the first retry.
    retry_delay: Duration,
    backoff: Backoff,
    /// Element size the caller expects, checked against the symbol when
    /// linking.
    data_size: Option<u32>,
}

impl FifoConfig {
    /// The default number of push retries
    pub const DEFAULT_MAX_RETRIES: u32 = 100;
    /// The default wait between push retries
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_micros(10);
    /// The longest wait between push retries, larger values are clamped
    pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
            backoff: Backoff::Fixed,
            data_size: None,
        }
    }

    /// Set the number of push retries. 0 means a push gives up on a full
    /// device right away.
    #[instrument(skip_all, parent = Span::current(), level = "Trace")]
    pub fn set_max_retries(&mut self, max_retries: u32) {
        self.max_retries = max_retries;
    }

    /// Set the wait before a retry, at most `MAX_RETRY_DELAY`.
    #[instrument(skip_all, parent = Span::current(), level = "Trace")]
    pub fn set_retry_delay(&mut self, retry_delay: Duration) {
        self.retry_delay = min(retry_delay, Self::MAX_RETRY_DELAY);
    }

    /// Set how the wait grows between retries. An exponential cap above
    /// `MAX_RETRY_DELAY` is clamped.
    #[instrument(skip_all, parent = Span::current(), level = "Trace")]
    pub fn set_backoff(&mut self, backoff: Backoff) {
        self.backoff = match backoff {
            Backoff::Fixed => Backoff::Fixed,
            Backoff::Exponential { max } => Backoff::Exponential {
                max: min(max, Self::MAX_RETRY_DELAY),
            },
        };
    }

    /// Require linked FIFOs to hold elements of exactly `data_size` bytes.
    /// `data_size` must be a positive multiple of 8, anything else is
    /// rejected and leaves the configuration unchanged.
    #[instrument(err(Debug), skip(self), parent = Span::current(), level = "Trace")]
    pub fn set_data_size(&mut self, data_size: u32) -> Result<()> {
        FifoGeometry::new(0, data_size).map_err(FifoError::InvalidConfiguration)?;
        self.data_size = Some(data_size);
        Ok(())
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn data_size(&self) -> Option<u32> {
        self.data_size
    }

    /// Wait before retry number `attempt`, counting from 0.
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.retry_delay,
            Backoff::Exponential { max } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                min(self.retry_delay.saturating_mul(factor), max)
            }
        }
    }
}

impl Default for FifoConfig {
    fn default() -> Self {
        Self::new()
    }
}
