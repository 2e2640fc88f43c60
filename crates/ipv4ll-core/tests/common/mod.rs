//! Test doubles and common utilities for engine contract tests
//!
//! This module provides a scripted ACD engine that emits chosen event
//! sequences on dispatch, without any network I/O.

#![allow(dead_code)]

use ipv4ll_core::traits::{Acd, AcdConfig, AcdEvent, AcdFactory, ArpFrame, DefendPolicy};
use ipv4ll_core::{Error, Ipv4llConfig, MacAddr, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::net::Ipv4Addr;
use std::os::fd::{AsFd, BorrowedFd};
use std::sync::{Arc, Mutex, MutexGuard};

/// The link address used throughout the tests
pub const TEST_MAC: MacAddr = MacAddr::new([0xfe, 0xdc, 0xba, 0x98, 0x76, 0x54]);

/// Observable state shared between a test and its scripted ACD engine
#[derive(Debug, Default)]
pub struct AcdScript {
    /// Events to queue, one batch per dispatch
    pub batches: VecDeque<Vec<AcdEvent>>,
    /// Events queued but not yet popped
    pub queued: VecDeque<AcdEvent>,
    /// Whether a probe run is active
    pub running: bool,
    /// Last configuration installed
    pub config: Option<AcdConfig>,
    /// Candidates of every successful start, in order
    pub starts: Vec<Ipv4Addr>,
    /// Number of upcoming start calls that fail
    pub start_failures: usize,
    /// Start calls made while a run was already active
    pub overlapping_starts: usize,
    /// Whether dispatch fails with an I/O error
    pub fail_dispatch: bool,
    /// Number of dispatch calls
    pub dispatch_count: usize,
    /// Number of stop calls
    pub stop_count: usize,
    /// Policies requested through announce
    pub announcements: Vec<DefendPolicy>,
}

/// Test-side handle to a scripted ACD engine
#[derive(Clone, Default)]
pub struct ScriptHandle {
    script: Arc<Mutex<AcdScript>>,
}

impl ScriptHandle {
    /// Lock the shared script
    pub fn script(&self) -> MutexGuard<'_, AcdScript> {
        self.script.lock().unwrap()
    }

    /// Queue `events` for the next dispatch that has no batch yet
    pub fn on_dispatch(&self, events: Vec<AcdEvent>) {
        self.script().batches.push_back(events);
    }

    /// Make the next `count` start calls fail
    pub fn fail_starts(&self, count: usize) {
        self.script().start_failures = count;
    }

    /// Let the ACD engine stop on its own, with DOWN reported on the next
    /// dispatch
    pub fn drop_link(&self) {
        let mut script = self.script();
        script.running = false;
        script.batches.push_back(vec![AcdEvent::Down]);
    }

    /// Candidates of every successful start
    pub fn starts(&self) -> Vec<Ipv4Addr> {
        self.script().starts.clone()
    }

    /// Whether the ACD engine has an active run
    pub fn running(&self) -> bool {
        self.script().running
    }

    /// Number of stop calls
    pub fn stop_count(&self) -> usize {
        self.script().stop_count
    }
}

/// ACD engine that replays scripted events
///
/// Unlike a real engine, `stop()` leaves already-queued events in place so
/// that tests can observe how the IPv4LL engine treats them.
pub struct ScriptedAcd {
    fd: File,
    script: Arc<Mutex<AcdScript>>,
}

impl ScriptedAcd {
    fn script(&self) -> MutexGuard<'_, AcdScript> {
        self.script.lock().unwrap()
    }
}

impl AsFd for ScriptedAcd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl Acd for ScriptedAcd {
    fn set_config(&mut self, config: &AcdConfig) -> Result<()> {
        let mut script = self.script();
        if script.running {
            return Err(Error::busy("ACD reconfigured while running"));
        }
        script.config = Some(*config);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let mut script = self.script();
        if script.running {
            script.overlapping_starts += 1;
            return Err(Error::busy("ACD already running"));
        }
        if script.start_failures > 0 {
            script.start_failures -= 1;
            return Err(Error::acd("link vanished"));
        }

        let config = script
            .config
            .ok_or_else(|| Error::acd("started without configuration"))?;
        script.running = true;
        script.starts.push(config.ip);
        Ok(())
    }

    fn stop(&mut self) {
        let mut script = self.script();
        script.running = false;
        script.stop_count += 1;
    }

    fn is_running(&self) -> bool {
        self.script().running
    }

    fn dispatch(&mut self) -> Result<()> {
        let mut script = self.script();
        script.dispatch_count += 1;
        if script.fail_dispatch {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "socket closed").into());
        }

        if let Some(batch) = script.batches.pop_front() {
            script.queued.extend(batch);
        }
        Ok(())
    }

    fn pop_event(&mut self) -> Result<Option<AcdEvent>> {
        let mut script = self.script();
        let event = script.queued.pop_front();
        if event == Some(AcdEvent::Down) {
            script.running = false;
        }
        Ok(event)
    }

    fn announce(&mut self, policy: DefendPolicy) -> Result<()> {
        let mut script = self.script();
        if !script.running {
            return Err(Error::acd("announce without an active run"));
        }
        script.announcements.push(policy);
        Ok(())
    }
}

/// Factory handing out scripted ACD engines bound to one script
#[derive(Default)]
pub struct ScriptedAcdFactory {
    handle: ScriptHandle,
    /// Whether create() fails
    pub fail: bool,
}

impl ScriptedAcdFactory {
    pub fn new() -> (Self, ScriptHandle) {
        let factory = Self::default();
        let handle = factory.handle.clone();
        (factory, handle)
    }

    /// A factory whose create() always fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl AcdFactory for ScriptedAcdFactory {
    fn create(&self) -> Result<Box<dyn Acd>> {
        if self.fail {
            return Err(Error::acd("out of memory"));
        }

        Ok(Box::new(ScriptedAcd {
            fd: File::open("/dev/null")?,
            script: Arc::clone(&self.handle.script),
        }))
    }
}

/// A reply frame from a conflicting host
pub fn conflicting_frame(ip: Ipv4Addr) -> ArpFrame {
    ArpFrame::reply(MacAddr::new([0x02, 0x00, 0x5e, 0x00, 0x00, 0x01]), ip)
}

/// Configuration with interface index 1, [`TEST_MAC`] and seed 0
pub fn test_config() -> Ipv4llConfig {
    Ipv4llConfig::new(1, TEST_MAC).with_enumeration(0)
}

/// The first candidates drawn with enumeration seed 0
pub const SEED_ZERO_CANDIDATES: [Ipv4Addr; 4] = [
    Ipv4Addr::new(169, 254, 148, 109),
    Ipv4Addr::new(169, 254, 94, 230),
    Ipv4Addr::new(169, 254, 94, 252),
    Ipv4Addr::new(169, 254, 207, 250),
];
