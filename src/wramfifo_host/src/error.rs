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

use thiserror::Error;
use wramfifo_common::{FifoKind, RingError};
use wramfifo_device::DeviceError;

pub type Result<T> = core::result::Result<T, FifoError>;

/// The error type for FIFO link operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FifoError {
    /// No symbol of that name in the device image
    #[error("FIFO symbol {0} not found")]
    SymbolNotFound(String),

    /// The symbol exists but is a plain variable
    #[error("Symbol {0} is not a FIFO")]
    NotAFifo(String),

    /// The symbol is a FIFO of the other direction
    #[error("FIFO {name} is an {found} FIFO, an {requested} FIFO was requested")]
    WrongDirection {
        name: String,
        requested: FifoKind,
        found: FifoKind,
    },

    /// The symbol's element size disagrees with the configuration
    #[error("FIFO {name} holds {declared} byte elements, {configured} bytes were configured")]
    SizeMismatch {
        name: String,
        declared: u32,
        configured: u32,
    },

    /// Pointer size, element size or alignment out of range
    #[error("Invalid FIFO configuration: {0}")]
    InvalidConfiguration(RingError),

    /// A block transfer did not complete
    #[error("Transfer with device {device} failed: {reason}")]
    TransferFailure { device: usize, reason: String },

    /// A device's input FIFO stayed full through every retry
    #[error("Input FIFO of device {device} still full after {retries} retries")]
    PushExhaustedRetries { device: usize, retries: u32 },

    /// A push did not provide exactly one element per device
    #[error("Push needs one element per device: {expected} devices, {got} elements")]
    InputCountMismatch { expected: usize, got: usize },

    /// A pushed element does not have the FIFO's element size
    #[error("Element for device {device} is {got} bytes, FIFO elements are {expected} bytes")]
    ElementSize {
        device: usize,
        expected: usize,
        got: usize,
    },

    /// Device index out of range for the rank
    #[error("Device {0} does not exist in this rank")]
    NoSuchDevice(usize),

    /// Device pointers that no correct peer could have produced
    #[error("Device {device} reports read pointer {read_ptr} and write pointer {write_ptr}")]
    CorruptPointers {
        device: usize,
        read_ptr: u64,
        write_ptr: u64,
    },

    /// Error from the in-process device model
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// A generic error with a message
    #[error("{0}")]
    Error(String),
}

impl From<&str> for FifoError {
    fn from(s: &str) -> Self {
        FifoError::Error(s.to_string())
    }
}

impl From<String> for FifoError {
    fn from(s: String) -> Self {
        FifoError::Error(s)
    }
}

/// Creates a `FifoError::Error` from a string literal or format string
#[macro_export]
macro_rules! new_error {
    ($msg:literal $(,)?) => {{
        let __args = std::format_args!($msg);
        let __err_msg = match __args.as_str() {
            Some(msg) => String::from(msg),
            None => std::format!($msg),
        };
        $crate::FifoError::Error(__err_msg)
    }};
    ($fmtstr:expr, $($arg:tt)*) => {{
        let __err_msg = std::format!($fmtstr, $($arg)*);
        $crate::error::FifoError::Error(__err_msg)
    }};
}
