//! Family agnostic storage for a socket address record.

use std::{cmp, fmt};

/// Capacity of an [`Endpoint`], large enough for any `sockaddr_storage`.
pub const ENDPOINT_CAPACITY: usize = 128;

/// Anything that can hand out a raw address record and its size.
pub trait AddressSource {
    fn data(&self) -> &[u8];

    fn size(&self) -> u32;
}

/// A copy of an opaque address record, e.g. the peer address of a transport.
///
/// The record is never interpreted. `size` may be larger than the bytes actually
/// stored when the source did not fit into [`ENDPOINT_CAPACITY`]; [`Endpoint::as_bytes`]
/// always clamps to the stored part.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    storage: [u8; ENDPOINT_CAPACITY],
    size: u32,
}

impl Endpoint {
    /// Copies up to `min(size, capacity)` bytes of `raw` and keeps `size` as reported.
    pub fn from_raw(raw: &[u8], size: u32) -> Self {
        let mut storage = [0u8; ENDPOINT_CAPACITY];
        let copied = cmp::min(cmp::min(size as usize, ENDPOINT_CAPACITY), raw.len());
        storage[..copied].copy_from_slice(&raw[..copied]);
        Self { storage, size }
    }

    pub fn from_source<T: AddressSource + ?Sized>(source: &T) -> Self {
        Self::from_raw(source.data(), source.size())
    }

    pub fn storage(&self) -> &[u8; ENDPOINT_CAPACITY] {
        &self.storage
    }

    /// Buffer to be filled in place, e.g. by a receive-from call; record the
    /// written length through [`Endpoint::size_mut`] afterwards.
    pub fn storage_mut(&mut self) -> &mut [u8; ENDPOINT_CAPACITY] {
        &mut self.storage
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn size_mut(&mut self) -> &mut u32 {
        &mut self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..cmp::min(self.size as usize, ENDPOINT_CAPACITY)]
    }

    pub fn is_truncated(&self) -> bool {
        self.size as usize > ENDPOINT_CAPACITY
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            storage: [0u8; ENDPOINT_CAPACITY],
            size: ENDPOINT_CAPACITY as u32,
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("size", &self.size)
            .field("data", &self.as_bytes())
            .finish()
    }
}

impl AddressSource for Endpoint {
    fn data(&self) -> &[u8] {
        self.as_bytes()
    }

    fn size(&self) -> u32 {
        self.size
    }
}

impl AddressSource for [u8] {
    fn data(&self) -> &[u8] {
        self
    }

    fn size(&self) -> u32 {
        self.len() as u32
    }
}

impl<const N: usize> AddressSource for [u8; N] {
    fn data(&self) -> &[u8] {
        self
    }

    fn size(&self) -> u32 {
        N as u32
    }
}

impl AddressSource for Vec<u8> {
    fn data(&self) -> &[u8] {
        self
    }

    fn size(&self) -> u32 {
        self.len() as u32
    }
}

#[cfg(feature = "tcp")]
impl AddressSource for socket2::SockAddr {
    fn data(&self) -> &[u8] {
        sockaddr_bytes(self)
    }

    fn size(&self) -> u32 {
        self.len() as u32
    }
}

/// The only place a raw socket address is read as bytes.
#[cfg(feature = "tcp")]
fn sockaddr_bytes(addr: &socket2::SockAddr) -> &[u8] {
    // SAFETY: a `SockAddr` owns a `sockaddr_storage`, `as_ptr` points at its start and
    // `len` never exceeds the storage size, so the slice stays valid while `addr` is
    // borrowed.
    unsafe { std::slice::from_raw_parts(addr.as_ptr().cast::<u8>(), addr.len() as usize) }
}
