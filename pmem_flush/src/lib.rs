//! Flush, fence and latency emulation primitives for byte addressable
//! non-volatile memory research on commodity cpus.
//!
//! The emulated backend flushes cache lines out of a volatile mapping and
//! busy-waits the configured media write latency per line. With the
//! `pmemio` feature the same call sites run against real persistent
//! memory through libpmem instead.

pub mod mapped;
#[cfg(feature = "pmemio")]
pub mod native;
pub mod persist;
pub mod platform;
pub mod timing;

/// Unit of transfer between the cache hierarchy and the persistence domain.
// TODO make it configurable
pub const CACHE_LINE_SIZE: usize = 64;

pub use mapped::{ArenaError, MappedArena};
#[cfg(feature = "pmemio")]
pub use native::Native;
pub use persist::{Emulated, PersistBackend};
pub use platform::{HostPlatform, Platform};
pub use timing::{cycles_to_ns, emulate_latency, ns_to_cycles, Timing};
