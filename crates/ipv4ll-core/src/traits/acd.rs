// # ACD Engine Trait
//
// Defines the contract of the address conflict detection (ACD) engine the
// IPv4LL engine drives.
//
// ## Responsibilities
//
// The ACD engine owns everything on the wire: ARP probe and announcement
// timing, packet construction, defense against conflicting hosts and the
// readiness descriptor. The IPv4LL engine only hands it a candidate, starts
// and stops it, and translates the events it queues.
//
// ## Usage
//
// ```rust,ignore
// use ipv4ll_core::traits::{Acd, AcdConfig};
//
// let mut acd = factory.create()?;
// acd.set_config(&AcdConfig { ifindex, mac, ip })?;
// acd.start()?;
//
// // once the descriptor is readable
// acd.dispatch()?;
// while let Some(event) = acd.pop_event()? {
//     println!("ACD event: {:?}", event);
// }
// ```

use crate::config::MacAddr;
use std::net::Ipv4Addr;
use std::os::fd::AsFd;

/// ARP payload carried by conflict-related ACD events
///
/// The IPv4LL engine never inspects the frame; it forwards it to the host so
/// the offending peer can be identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpFrame {
    /// ARP operation (1 = request, 2 = reply)
    pub operation: u16,
    /// Sender hardware address
    pub sender_mac: MacAddr,
    /// Sender protocol address
    pub sender_ip: Ipv4Addr,
    /// Target hardware address
    pub target_mac: MacAddr,
    /// Target protocol address
    pub target_ip: Ipv4Addr,
}

impl ArpFrame {
    /// ARP request operation code
    pub const REQUEST: u16 = 1;
    /// ARP reply operation code
    pub const REPLY: u16 = 2;

    /// A reply from `sender_mac` claiming `sender_ip`
    pub fn reply(sender_mac: MacAddr, sender_ip: Ipv4Addr) -> Self {
        Self {
            operation: Self::REPLY,
            sender_mac,
            sender_ip,
            target_mac: MacAddr::default(),
            target_ip: Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// Events queued by the ACD engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcdEvent {
    /// Probing finished, the candidate is ours
    Ready,

    /// The candidate was found in use while probing
    Used(ArpFrame),

    /// A conflicting claim was answered and the address kept
    Defended(ArpFrame),

    /// A conflicting claim could not be defended, the address is lost
    Conflict(ArpFrame),

    /// The link went away, the engine stopped itself
    Down,
}

/// Defense policy requested through [`Acd::announce`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefendPolicy {
    /// Never defend, give up on the first conflict
    Never,
    /// Defend once, give up on a repeated conflict
    Once,
    /// Always defend
    Always,
}

/// Candidate and link binding handed to the ACD engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcdConfig {
    /// Interface index
    pub ifindex: u32,
    /// Link-layer address of the interface
    pub mac: MacAddr,
    /// Candidate address to probe
    pub ip: Ipv4Addr,
}

/// Trait for ACD engine implementations
///
/// The readiness descriptor is exposed through the [`AsFd`] supertrait. The
/// host waits for it to become readable, then calls [`Acd::dispatch`]
/// (through the IPv4LL engine).
///
/// All methods are synchronous and must not block. Destruction is `Drop`.
pub trait Acd: AsFd {
    /// Install the candidate and link binding for the next run
    ///
    /// Only valid while stopped.
    fn set_config(&mut self, config: &AcdConfig) -> Result<(), crate::Error>;

    /// Start probing the configured candidate
    fn start(&mut self) -> Result<(), crate::Error>;

    /// Stop the current run and flush queued events
    ///
    /// Stopping a stopped engine is a no-op.
    fn stop(&mut self);

    /// Whether a run is in progress (probing, announcing or defending)
    fn is_running(&self) -> bool;

    /// Process descriptor readiness, queueing any resulting events
    fn dispatch(&mut self) -> Result<(), crate::Error>;

    /// Take the oldest queued event
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))`: An event was queued
    /// - `Ok(None)`: The queue is empty
    /// - `Err(Error)`: The engine failed while producing the event
    fn pop_event(&mut self) -> Result<Option<AcdEvent>, crate::Error>;

    /// Announce the current address and switch to `policy`
    fn announce(&mut self, policy: DefendPolicy) -> Result<(), crate::Error>;
}

/// Helper trait for constructing ACD engines
pub trait AcdFactory {
    /// Create a fresh, stopped ACD engine
    fn create(&self) -> Result<Box<dyn Acd>, crate::Error>;
}
