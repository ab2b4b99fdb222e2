//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The `memory` module: word-addressed register access over RPC.
//!
//! Exposes two methods:
//!
//! - `memory.Read(address, count) -> word array`
//! - `memory.Write(address, data) -> ()`
//!
//! Addresses are byte addresses of aligned 32-bit words (stride 4), the way
//! a memory-mapped register space is addressed. The backing store is a
//! [`RegisterBank`]; reads of unmapped addresses fail with an `EIO` domain
//! error that travels verbatim to the caller, writes map pages on demand.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tdrpc::dispatch::{Module, Registry, RegistrationError};
use tdrpc::method::{Method, MethodError};

/// Version tag clients match against with `load_module`.
pub const MODULE_VERSION_KEY: &str = "memory v1.0.1";

/// Reads `count` words starting at `address`.
pub struct Read;

impl Method for Read {
    const MODULE: &'static str = "memory";
    const NAME: &'static str = "Read";
    const REVISION: u32 = 1;
    type Args = (u32, u32);
    type Output = Vec<u32>;
}

/// Writes `data` starting at `address`.
pub struct Write;

impl Method for Write {
    const MODULE: &'static str = "memory";
    const NAME: &'static str = "Write";
    const REVISION: u32 = 1;
    type Args = (u32, Vec<u32>);
    type Output = ();
}

/// A sparse, word-addressed register space.
///
/// Stands in for the memory service a real board exposes: reads hit only
/// what has been mapped, writes populate freely.
#[derive(Debug, Default)]
pub struct RegisterBank {
    words: Mutex<HashMap<u32, u32>>,
}

impl RegisterBank {
    /// Creates an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `contents` as consecutive words starting at `base`.
    pub fn map_region(&self, base: u32, contents: &[u32]) {
        let mut words = self.lock();
        for (index, word) in contents.iter().enumerate() {
            words.insert(base.wrapping_add(4 * index as u32), *word);
        }
    }

    /// Reads `count` words starting at `address`.
    ///
    /// # Errors
    ///
    /// `read memsvc error: EIO` for unmapped addresses,
    /// `read memsvc error: EFAULT` if the range wraps the address space.
    pub fn read(&self, address: u32, count: u32) -> Result<Vec<u32>, MethodError> {
        let words = self.lock();
        let mut result = Vec::with_capacity(count as usize);
        for index in 0..count {
            let offset = index
                .checked_mul(4)
                .and_then(|bytes| address.checked_add(bytes))
                .ok_or_else(|| MethodError::new("read memsvc error: EFAULT"))?;
            let word = words
                .get(&offset)
                .ok_or_else(|| MethodError::new("read memsvc error: EIO"))?;
            result.push(*word);
        }
        Ok(result)
    }

    /// Writes `data` as consecutive words starting at `address`.
    ///
    /// # Errors
    ///
    /// `write memsvc error: EFAULT` if the range wraps the address space.
    pub fn write(&self, address: u32, data: &[u32]) -> Result<(), MethodError> {
        let mut words = self.lock();
        for (index, word) in data.iter().enumerate() {
            let offset = u32::try_from(index)
                .ok()
                .and_then(|i| i.checked_mul(4))
                .and_then(|bytes| address.checked_add(bytes))
                .ok_or_else(|| MethodError::new("write memsvc error: EFAULT"))?;
            words.insert(offset, *word);
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u32, u32>> {
        // A poisoned bank is still a consistent HashMap.
        self.words.lock().unwrap_or_else(|err| err.into_inner())
    }
}

/// The `memory` plug-in module.
pub struct MemoryModule {
    bank: Arc<RegisterBank>,
}

impl MemoryModule {
    /// Creates the module over an existing register bank.
    pub fn new(bank: Arc<RegisterBank>) -> Self {
        MemoryModule { bank }
    }
}

impl Module for MemoryModule {
    fn name(&self) -> &str {
        "memory"
    }

    fn version_key(&self) -> &str {
        MODULE_VERSION_KEY
    }

    fn init(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        let bank = Arc::clone(&self.bank);
        registry.register::<Read, _>(move |(address, count)| bank.read(address, count))?;

        let bank = Arc::clone(&self.bank);
        registry.register::<Write, _>(move |(address, data)| bank.write(address, &data))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_back_what_was_written() {
        let bank = RegisterBank::new();
        bank.write(0x1000, &[0xa, 0xb, 0xc]).unwrap();
        assert_eq!(bank.read(0x1000, 3).unwrap(), vec![0xa, 0xb, 0xc]);
        assert_eq!(bank.read(0x1008, 1).unwrap(), vec![0xc]);
    }

    #[test]
    fn test_unmapped_read_is_eio() {
        let bank = RegisterBank::new();
        let err = bank.read(0, 1).unwrap_err();
        assert_eq!(err.to_string(), "read memsvc error: EIO");
    }

    #[test]
    fn test_wrapping_range_is_efault() {
        let bank = RegisterBank::new();
        bank.map_region(u32::MAX - 7, &[1, 2]);
        let err = bank.read(u32::MAX - 7, 3).unwrap_err();
        assert_eq!(err.to_string(), "read memsvc error: EFAULT");
    }

    #[test]
    fn test_module_registers_both_methods() {
        let mut registry = Registry::new();
        let module = MemoryModule::new(Arc::new(RegisterBank::new()));
        module.init(&mut registry).unwrap();
        assert!(registry.handler("memory.Read").is_some());
        assert!(registry.handler("memory.Write").is_some());
        assert_eq!(registry.len(), 2);
    }
}
