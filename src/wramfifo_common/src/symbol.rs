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

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::layout::{FifoGeometry, FifoKind, FifoLayout};

/// What a symbol in device memory declares itself to be.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// A FIFO header followed by its slots.
    Fifo(FifoKind, FifoGeometry),
    /// A plain host-visible variable.
    Variable,
}

/// A named region in device memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Byte address in device memory.
    pub address: u64,
    /// Size of the region in bytes.
    pub size: usize,
    pub kind: SymbolKind,
}

impl Symbol {
    /// Layout of the FIFO this symbol declares, if it declares one.
    pub fn fifo_layout(&self) -> Option<(FifoKind, FifoLayout)> {
        match self.kind {
            SymbolKind::Fifo(kind, geometry) => FifoLayout::from_base(self.address, geometry)
                .ok()
                .map(|layout| (kind, layout)),
            SymbolKind::Variable => None,
        }
    }
}

/// Symbols of a loaded device program, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(name.into(), symbol)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.symbols.iter().map(|(name, sym)| (name.as_str(), sym))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
