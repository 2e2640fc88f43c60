//! Minimal embedding example for ipv4ll-core
//!
//! This example drives the engine against a simulated link on which some
//! link-local addresses are already owned by other hosts. The dispatch loop
//! is fully managed by the application.

use ipv4ll_core::traits::{Acd, AcdConfig, AcdEvent, AcdFactory, ArpFrame, DefendPolicy};
use ipv4ll_core::{Error, Ipv4ll, Ipv4llConfig, Ipv4llEvent, MacAddr, Result};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::net::Ipv4Addr;
use std::os::fd::{AsFd, BorrowedFd};
use std::rc::Rc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Hosts already present on the simulated link, by address
type Neighbours = Rc<RefCell<HashMap<Ipv4Addr, MacAddr>>>;

/// ACD engine answering probes from a table of neighbours
///
/// Each dispatch completes one probe: the candidate is reported as used if a
/// neighbour owns it, ready otherwise.
struct SimulatedAcd {
    fd: File,
    neighbours: Neighbours,
    config: Option<AcdConfig>,
    probing: bool,
    running: bool,
    queue: VecDeque<AcdEvent>,
}

impl AsFd for SimulatedAcd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl Acd for SimulatedAcd {
    fn set_config(&mut self, config: &AcdConfig) -> Result<()> {
        if self.running {
            return Err(Error::busy("simulated ACD is running"));
        }
        self.config = Some(*config);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.config.is_none() {
            return Err(Error::acd("no candidate configured"));
        }
        self.running = true;
        self.probing = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        self.probing = false;
        self.queue.clear();
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn dispatch(&mut self) -> Result<()> {
        let Some(config) = self.config.filter(|_| self.probing) else {
            return Ok(());
        };
        self.probing = false;

        let event = match self.neighbours.borrow().get(&config.ip) {
            Some(owner) => AcdEvent::Used(ArpFrame::reply(*owner, config.ip)),
            None => AcdEvent::Ready,
        };
        self.queue.push_back(event);
        Ok(())
    }

    fn pop_event(&mut self) -> Result<Option<AcdEvent>> {
        Ok(self.queue.pop_front())
    }

    fn announce(&mut self, policy: DefendPolicy) -> Result<()> {
        if !self.running {
            return Err(Error::acd("nothing to announce"));
        }
        info!("Announcing {:?} with policy {:?}", self.config.map(|c| c.ip), policy);
        Ok(())
    }
}

struct SimulatedAcdFactory {
    neighbours: Neighbours,
}

impl AcdFactory for SimulatedAcdFactory {
    fn create(&self) -> Result<Box<dyn Acd>> {
        Ok(Box::new(SimulatedAcd {
            fd: File::open("/dev/null")?,
            neighbours: Rc::clone(&self.neighbours),
            config: None,
            probing: false,
            running: false,
            queue: VecDeque::new(),
        }))
    }
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("=== Embedded ipv4ll-core Example ===\n");

    // The first two candidates of seed 0 are taken by other hosts
    let neighbours: Neighbours = Rc::new(RefCell::new(HashMap::from([
        (
            Ipv4Addr::new(169, 254, 148, 109),
            MacAddr::new([0x02, 0, 0, 0, 0, 0x01]),
        ),
        (
            Ipv4Addr::new(169, 254, 94, 230),
            MacAddr::new([0x02, 0, 0, 0, 0, 0x02]),
        ),
    ])));

    let config = Ipv4llConfig::from_json(
        &serde_json::json!({
            "ifindex": 1,
            "mac": "fe:dc:ba:98:76:54",
            "enumeration": 0,
        })
        .to_string(),
    )?;

    let factory = SimulatedAcdFactory { neighbours };
    let mut engine = Ipv4ll::new(&factory)?;
    engine.configure(&config)?;
    engine.start()?;

    // A real host would poll engine.as_fd() for readability here
    let mut address = None;
    for _ in 0..16 {
        engine.dispatch()?;

        match engine.pop_event() {
            Some(Ipv4llEvent::Ready { address: ip }) => {
                address = Some(ip);
                break;
            }
            Some(Ipv4llEvent::Down) => anyhow::bail!("link went down"),
            Some(event) => println!("[Embedded] {:?}", event),
            None => {}
        }
    }

    let address = address.ok_or_else(|| anyhow::anyhow!("no address claimed"))?;
    println!("[Embedded] Claimed {}", address);

    engine.announce()?;
    engine.stop();

    println!("\n=== Example Complete ===");
    Ok(())
}
