//! Target memory access
//!
//! [`MemorySource`] is the seam between the object model and whatever
//! actually holds the bytes: a live process, a core dump, or the sparse
//! in-memory [`SnapshotMemory`] image used by snapshot files and tests.

use crate::error::{Result, SdbError};
use std::collections::BTreeMap;

/// Granularity of the snapshot image. Pages are mapped zero-filled on first write.
pub const PAGE_SIZE: u64 = 4096;

/// Read-only view of target memory
///
/// Implementations must be `Send + Sync` so a program can be shared
/// behind an `Arc`.
#[cfg_attr(test, mockall::automock)]
pub trait MemorySource: Send + Sync {
    /// Read `size` bytes starting at `address`
    fn read_memory(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Whether `address` lies in mapped memory
    fn is_mapped(&self, address: u64) -> bool {
        self.read_memory(address, 1).is_ok()
    }
}

/// Sparse, page-granular memory image
#[derive(Debug, Default, Clone)]
pub struct SnapshotMemory {
    pages: BTreeMap<u64, Vec<u8>>,
}

impl SnapshotMemory {
    /// Create a new empty image
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    fn page_base(address: u64) -> u64 {
        address & !(PAGE_SIZE - 1)
    }

    /// Map a zero-filled region
    pub fn map(&mut self, base_address: u64, size: u64) {
        if size == 0 {
            return;
        }
        let last = base_address.saturating_add(size - 1);
        let mut page = Self::page_base(base_address);
        loop {
            self.pages
                .entry(page)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize]);
            match page.checked_add(PAGE_SIZE) {
                Some(next) if next <= last => page = next,
                _ => break,
            }
        }
    }

    /// Write data to memory, mapping pages as needed
    pub fn write(&mut self, address: u64, data: &[u8]) {
        self.map(address, data.len() as u64);
        let mut written = 0usize;
        while written < data.len() {
            let current = address + written as u64;
            let base = Self::page_base(current);
            let offset = (current - base) as usize;
            let chunk = (PAGE_SIZE as usize - offset).min(data.len() - written);
            if let Some(page) = self.pages.get_mut(&base) {
                page[offset..offset + chunk].copy_from_slice(&data[written..written + chunk]);
            }
            written += chunk;
        }
    }

    /// Write a little-endian 64-bit word
    pub fn write_u64(&mut self, address: u64, value: u64) {
        self.write(address, &value.to_le_bytes());
    }

    /// Write a little-endian 32-bit word
    pub fn write_u32(&mut self, address: u64, value: u32) {
        self.write(address, &value.to_le_bytes());
    }

    /// Write a NUL-terminated string
    pub fn write_cstr(&mut self, address: u64, value: &str) {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.write(address, &bytes);
    }

    /// Number of mapped pages
    pub fn mapped_pages(&self) -> usize {
        self.pages.len()
    }
}

impl MemorySource for SnapshotMemory {
    fn read_memory(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(size);
        while out.len() < size {
            let current = address
                .checked_add(out.len() as u64)
                .ok_or_else(|| SdbError::MemoryAccess {
                    address,
                    message: "address overflow".to_string(),
                })?;
            let base = Self::page_base(current);
            let page = self.pages.get(&base).ok_or_else(|| SdbError::MemoryAccess {
                address: current,
                message: "address not mapped in snapshot".to_string(),
            })?;
            let offset = (current - base) as usize;
            let chunk = (PAGE_SIZE as usize - offset).min(size - out.len());
            out.extend_from_slice(&page[offset..offset + chunk]);
        }
        Ok(out)
    }
}
