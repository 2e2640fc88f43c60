//! Core traits for the IPv4LL engine
//!
//! This module defines the abstract interfaces of the collaborators the
//! engine drives.
//!
//! - [`Acd`]: Address conflict detection engine (probe, announce, defend)
//! - [`AcdFactory`]: Construction of ACD engines

pub mod acd;

pub use acd::{Acd, AcdConfig, AcdEvent, AcdFactory, ArpFrame, DefendPolicy};
