//! Link-local address selection
//!
//! Candidates are drawn pseudo-randomly from `169.254.0.0/16`, skipping the
//! first and last 256 addresses of the block which RFC 3927 reserves.
//!
//! The default generator is [`Lcg48`], the 48-bit linear congruential
//! generator of the `drand48` family. Seeding it with the same enumeration
//! value always yields the same address sequence, and that sequence matches
//! `seed48()` + `mrand48()` bit for bit.

use rand::{RngCore, SeedableRng};
use std::net::Ipv4Addr;

/// The IPv4 link-local network prefix (`169.254.0.0/16`)
pub const IPV4LL_NETWORK: Ipv4Addr = Ipv4Addr::new(169, 254, 0, 0);

/// Lowest acceptable host offset within the link-local block
pub const MIN_OFFSET: u16 = 0x0100;

/// Highest acceptable host offset within the link-local block
pub const MAX_OFFSET: u16 = 0xfdff;

/// Whether `addr` is a link-local address outside the reserved ranges
pub fn is_selectable(addr: Ipv4Addr) -> bool {
    let [a, b, c, d] = addr.octets();
    let offset = u16::from_be_bytes([c, d]);
    [a, b] == [169, 254] && (MIN_OFFSET..=MAX_OFFSET).contains(&offset)
}

const LCG48_MULTIPLIER: u64 = 0x5_deec_e66d;
const LCG48_INCREMENT: u64 = 0xb;
const LCG48_MASK: u64 = (1 << 48) - 1;

/// 48-bit linear congruential generator (`drand48` parameters)
///
/// Only the low 48 bits of the seed are significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg48 {
    state: u64,
}

impl Lcg48 {
    fn step(&mut self) -> u64 {
        self.state = LCG48_MULTIPLIER
            .wrapping_mul(self.state)
            .wrapping_add(LCG48_INCREMENT)
            & LCG48_MASK;
        self.state
    }
}

impl RngCore for Lcg48 {
    /// Upper 32 of the 48 state bits, as `mrand48()` returns them
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 16) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    #[inline]
    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut left = dst;
        while left.len() >= 4 {
            let (l, r) = left.split_at_mut(4);
            left = r;
            l.copy_from_slice(&self.next_u32().to_le_bytes());
        }
        let n = left.len();
        if n > 0 {
            left.copy_from_slice(&self.next_u32().to_le_bytes()[..n]);
        }
    }
}

impl SeedableRng for Lcg48 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            state: u64::from_le_bytes(seed) & LCG48_MASK,
        }
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::from_seed(state.to_le_bytes())
    }
}

/// Pseudo-random candidate address generator
///
/// Each draw takes a full 32-bit value and folds its halves together into a
/// 16-bit host offset. Offsets in the reserved ranges are rejected and
/// redrawn, so every returned address satisfies [`is_selectable`].
///
/// The selector is also an endless [`Iterator`] of candidates.
#[derive(Debug, Clone)]
pub struct AddressSelector<R = Lcg48> {
    rng: R,
}

impl AddressSelector<Lcg48> {
    /// Create a selector seeded with `enumeration`
    pub fn new(enumeration: u64) -> Self {
        Self {
            rng: Lcg48::seed_from_u64(enumeration),
        }
    }
}

impl Default for AddressSelector<Lcg48> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<R: RngCore> AddressSelector<R> {
    /// Create a selector over an arbitrary generator
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Draw the next candidate address
    pub fn select(&mut self) -> Ipv4Addr {
        loop {
            let result = self.rng.next_u32();
            let offset = (result ^ (result >> 16)) as u16;

            if !(MIN_OFFSET..=MAX_OFFSET).contains(&offset) {
                continue;
            }

            return Ipv4Addr::from(u32::from(IPV4LL_NETWORK) | u32::from(offset));
        }
    }
}

impl<R: RngCore + SeedableRng> AddressSelector<R> {
    /// Discard the generator state and reseed it from `enumeration`
    pub fn seed(&mut self, enumeration: u64) {
        self.rng = R::seed_from_u64(enumeration);
    }
}

impl<R: RngCore> Iterator for AddressSelector<R> {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        Some(self.select())
    }
}
