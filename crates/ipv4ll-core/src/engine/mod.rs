//! IPv4 link-local engine
//!
//! The Ipv4ll engine is responsible for:
//! - Selecting candidate addresses in `169.254.0.0/16`
//! - Handing each candidate to the ACD engine and starting a probe run
//! - Translating ACD events into IPv4LL events for the host
//! - Reselecting and restarting on conflicts
//!
//! ## Architecture
//!
//! ```text
//!   host event loop
//!        │  fd readable
//!        ▼
//! ┌──────────────┐  dispatch / pop_event  ┌─────────────┐
//! │    Ipv4ll    │───────────────────────▶│     Acd     │
//! │              │◀───────────────────────│  (probing)  │
//! └──────────────┘       AcdEvent         └─────────────┘
//!        │    ▲
//!        │    └── AddressSelector (next candidate)
//!        ▼
//!   Ipv4llEvent ──▶ mailbox (pop_event) or callback
//! ```
//!
//! ## Event Flow
//!
//! 1. Host calls `dispatch()` when the descriptor is readable
//! 2. The ACD engine processes readiness and queues events
//! 3. Each queued event is looked up in the [`transition`] table
//! 4. Conflicts stop the run, draw a new candidate and restart
//! 5. Outcomes are delivered to the host in ACD order

mod delivery;
pub mod transition;

pub use delivery::EventCallback;

use crate::config::{Ipv4llConfig, MacAddr};
use crate::error::{Error, Result};
use crate::selector::AddressSelector;
use crate::traits::{Acd, AcdConfig, AcdEvent, AcdFactory, ArpFrame, DefendPolicy};
use delivery::Delivery;
use std::net::Ipv4Addr;
use std::os::fd::{AsFd, BorrowedFd};
use tracing::{debug, info, warn};
use transition::{Action, Transition};

/// Events delivered to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ipv4llEvent {
    /// The address is claimed and may be configured on the interface
    Ready { address: Ipv4Addr },

    /// A conflicting claim was answered, the address is kept
    Defended { frame: ArpFrame },

    /// The address was lost; a new candidate is already being probed
    Conflict { frame: ArpFrame },

    /// The run ended, the engine is stopped
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running { candidate: Ipv4Addr, ready: bool },
}

/// IPv4 link-local engine
///
/// Owns one ACD engine and drives it through probe runs, one candidate at a
/// time.
///
/// ## Lifecycle
///
/// 1. Create with [`Ipv4ll::new()`]
/// 2. Configure with [`Ipv4ll::configure()`] or the individual setters
/// 3. Start with [`Ipv4ll::start()`] or [`Ipv4ll::start_with_callback()`]
/// 4. Call [`Ipv4ll::dispatch()`] whenever the descriptor is readable
/// 5. Stop with [`Ipv4ll::stop()`], or wait for [`Ipv4llEvent::Down`]
/// 6. Drop to release the ACD engine
///
/// ## Threading
///
/// The engine has no threads or timers of its own. All calls are synchronous
/// and non-blocking; callers sharing an engine across threads must serialize
/// access themselves.
pub struct Ipv4ll {
    /// ACD engine probing the current candidate
    acd: Box<dyn Acd>,

    /// Candidate generator
    selector: AddressSelector,

    /// Seed the selector is reset to on every start
    enumeration: u64,

    /// Interface index of the link binding
    ifindex: Option<u32>,

    /// MAC address of the link binding
    mac: Option<MacAddr>,

    /// Restart attempts after a conflict before giving up
    restart_attempts: usize,

    phase: Phase,

    /// Where translated events go
    delivery: Delivery,
}

impl Ipv4ll {
    /// Create a new, unconfigured engine
    ///
    /// # Parameters
    ///
    /// - `factory`: Creates the ACD engine owned by this instance
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4ll)`: A stopped engine
    /// - `Err(Error)`: The ACD engine could not be created
    pub fn new(factory: &dyn AcdFactory) -> Result<Self> {
        let acd = factory.create()?;

        Ok(Self {
            acd,
            selector: AddressSelector::default(),
            enumeration: 0,
            ifindex: None,
            mac: None,
            restart_attempts: crate::config::EngineConfig::default().restart_attempts,
            phase: Phase::Idle,
            delivery: Delivery::mailbox(),
        })
    }

    /// Apply a full configuration
    ///
    /// Fails with [`Error::Busy`] while running, and with [`Error::Config`]
    /// if the configuration is invalid. Nothing is changed on failure.
    pub fn configure(&mut self, config: &Ipv4llConfig) -> Result<()> {
        self.ensure_idle("configure")?;
        config.validate()?;

        self.ifindex = Some(config.ifindex);
        self.mac = Some(config.mac);
        self.restart_attempts = config.engine.restart_attempts;
        if let Some(enumeration) = config.enumeration {
            self.enumeration = enumeration;
        }

        debug!(
            "Configured ifindex {} mac {} (enumeration: {:?})",
            config.ifindex, config.mac, config.enumeration
        );
        Ok(())
    }

    /// Set the interface index (must be > 0)
    pub fn set_ifindex(&mut self, ifindex: u32) -> Result<()> {
        self.ensure_idle("set interface index")?;
        if ifindex == 0 {
            return Err(Error::config("Interface index must be > 0"));
        }

        self.ifindex = Some(ifindex);
        Ok(())
    }

    /// Set the link-layer address (must not be all zeros)
    pub fn set_mac(&mut self, mac: MacAddr) -> Result<()> {
        self.ensure_idle("set MAC address")?;
        if mac.is_zero() {
            return Err(Error::config("MAC address cannot be all zeros"));
        }

        self.mac = Some(mac);
        Ok(())
    }

    /// Set the seed of the address selector
    ///
    /// Every start reseeds the selector from this value, so the same
    /// enumeration always yields the same candidate sequence. Defaults to 0.
    pub fn set_enumeration(&mut self, enumeration: u64) -> Result<()> {
        self.ensure_idle("reseed")?;
        self.enumeration = enumeration;
        Ok(())
    }

    /// Start a run, delivering events through [`Ipv4ll::pop_event()`]
    pub fn start(&mut self) -> Result<()> {
        self.start_with(Delivery::mailbox())
    }

    /// Start a run, delivering events to `callback` from within dispatch
    ///
    /// The callback is dropped by [`Ipv4ll::stop()`].
    pub fn start_with_callback<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&Ipv4llEvent) + 'static,
    {
        self.start_with(Delivery::Callback(Box::new(callback)))
    }

    fn start_with(&mut self, delivery: Delivery) -> Result<()> {
        self.ensure_idle("start")?;
        self.delivery = Delivery::mailbox();
        self.binding()?;

        self.selector.seed(self.enumeration);
        let candidate = self.selector.select();
        if let Err(e) = self.launch(candidate) {
            self.acd.stop();
            warn!("Failed to start probing {}: {}", candidate, e);
            return Err(e);
        }

        self.phase = Phase::Running {
            candidate,
            ready: false,
        };
        self.delivery = delivery;
        info!("Started, probing {}", candidate);
        Ok(())
    }

    /// Stop the current run
    ///
    /// Discards any undelivered event and drops the callback. Stopping a
    /// stopped engine is a no-op.
    pub fn stop(&mut self) {
        self.acd.stop();
        self.delivery = Delivery::mailbox();

        if let Phase::Running { candidate, .. } = self.phase {
            self.phase = Phase::Idle;
            info!("Stopped, released {}", candidate);
        }
    }

    /// Process descriptor readiness
    ///
    /// Pumps the ACD engine once and translates every event it queued, in
    /// order. Safe to call while stopped.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: All queued events were handled
    /// - `Err(Error)`: The ACD engine failed to dispatch
    pub fn dispatch(&mut self) -> Result<()> {
        self.acd.dispatch()?;

        while let Some(event) = self.acd.pop_event()? {
            self.handle_acd_event(event);
        }

        Ok(())
    }

    /// Take the pending event, if any
    ///
    /// Always `None` when events are delivered to a callback.
    pub fn pop_event(&mut self) -> Option<Ipv4llEvent> {
        self.delivery.take()
    }

    /// Announce the current address and defend it once
    pub fn announce(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(Error::NotRunning);
        }

        self.acd.announce(DefendPolicy::Once)
    }

    /// Whether a run is in progress and the ACD engine is still probing,
    /// announcing or defending
    ///
    /// Turns false as soon as the ACD engine stops itself, even before its
    /// DOWN event is dispatched. Configuration stays locked until then.
    pub fn is_running(&self) -> bool {
        self.is_active() && self.acd.is_running()
    }

    /// Whether a run has been started and not yet ended by stop or DOWN
    fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    /// The address confirmed by the last READY event
    ///
    /// Fails with [`Error::AddressNotAvailable`] until the current candidate
    /// is ready.
    pub fn address(&self) -> Result<Ipv4Addr> {
        match self.phase {
            Phase::Running {
                candidate,
                ready: true,
            } => Ok(candidate),
            _ => Err(Error::AddressNotAvailable),
        }
    }

    /// The candidate currently being probed or held
    pub fn candidate(&self) -> Option<Ipv4Addr> {
        match self.phase {
            Phase::Running { candidate, .. } => Some(candidate),
            Phase::Idle => None,
        }
    }

    /// Interface index, if set
    pub fn ifindex(&self) -> Option<u32> {
        self.ifindex
    }

    /// MAC address, if set
    pub fn mac(&self) -> Option<MacAddr> {
        self.mac
    }

    fn ensure_idle(&self, operation: &str) -> Result<()> {
        if self.is_active() {
            return Err(Error::busy(format!("cannot {operation} while running")));
        }
        Ok(())
    }

    fn binding(&self) -> Result<(u32, MacAddr)> {
        let ifindex = self
            .ifindex
            .ok_or_else(|| Error::not_configured("interface index not set"))?;
        let mac = self
            .mac
            .ok_or_else(|| Error::not_configured("MAC address not set"))?;
        Ok((ifindex, mac))
    }

    /// Install `candidate` in the ACD engine and start probing it
    fn launch(&mut self, candidate: Ipv4Addr) -> Result<()> {
        let (ifindex, mac) = self.binding()?;

        self.acd.set_config(&AcdConfig {
            ifindex,
            mac,
            ip: candidate,
        })?;
        self.acd.start()
    }

    /// Stop the current run and restart it with fresh candidates
    fn reselect(&mut self) -> Result<Ipv4Addr> {
        self.acd.stop();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let candidate = self.selector.select();

            match self.launch(candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if attempt >= self.restart_attempts => return Err(e),
                Err(e) => {
                    warn!("Restart attempt {} with {} failed: {}", attempt, candidate, e);
                    self.acd.stop();
                }
            }
        }
    }

    fn handle_acd_event(&mut self, event: AcdEvent) {
        let Phase::Running { candidate, .. } = self.phase else {
            debug!("Discarding {:?} while stopped", event);
            return;
        };

        let mut transition = Transition::for_event(&event, candidate);

        match transition.action {
            Action::Remain => {
                if event == AcdEvent::Ready {
                    info!("Address {} is ready", candidate);
                    self.phase = Phase::Running {
                        candidate,
                        ready: true,
                    };
                }
            }
            Action::Reselect => {
                match event {
                    AcdEvent::Conflict(_) => warn!("Lost {} to a conflicting host", candidate),
                    _ => debug!("Candidate {} is in use", candidate),
                }

                match self.reselect() {
                    Ok(next) => {
                        debug!("Reselected {} after {}", next, candidate);
                        self.phase = Phase::Running {
                            candidate: next,
                            ready: false,
                        };
                    }
                    Err(e) => {
                        warn!("Giving up after failed restart: {}", e);
                        transition = Transition::give_up();
                    }
                }
            }
            Action::Halt => {}
        }

        if transition.action == Action::Halt {
            self.acd.stop();
            self.phase = Phase::Idle;
            info!("Link down, stopped probing");
        }

        if let Some(outcome) = transition.outcome {
            self.delivery.deliver(outcome);
        }
    }
}

impl AsFd for Ipv4ll {
    /// The ACD engine's readiness descriptor
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.acd.as_fd()
    }
}

impl Drop for Ipv4ll {
    fn drop(&mut self) {
        self.stop();
    }
}
