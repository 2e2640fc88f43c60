// # ipv4ll-core
//
// Core library for dynamic IPv4 link-local address configuration (RFC 3927).
//
// ## Architecture Overview
//
// This library selects link-local addresses and drives an address conflict
// detection engine to claim them:
// - **AddressSelector**: Seeded, reproducible candidate generator
// - **Acd**: Trait for the ACD engine that probes, announces and defends
// - **Ipv4ll**: Engine tying candidates to ACD runs, with conflict retry
//
// ## Design Principles
//
// 1. **Externally Driven**: No threads or timers; the host polls the
//    descriptor and calls `dispatch()`
// 2. **Wire-Agnostic**: ARP I/O belongs to the ACD engine
// 3. **Reproducible**: The same enumeration seed yields the same candidates
// 4. **Library-First**: The host owns the event loop and the process

pub mod config;
pub mod engine;
pub mod error;
pub mod selector;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, Ipv4llConfig, MacAddr};
pub use engine::{Ipv4ll, Ipv4llEvent};
pub use error::{Error, Result};
pub use selector::AddressSelector;
pub use traits::{Acd, AcdFactory};
