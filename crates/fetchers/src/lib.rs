//! Upstream feed fetchers and per-request upstream proxies.
//!
//! Each feed module exposes a single `refresh` operation that fetches its
//! upstream, transforms the payload into the exact byte format the client
//! parses, and atomically replaces the one artifact it owns. Parsers are
//! plain functions over text so they test without a network.

pub mod client;

pub mod aurora;
pub mod contests;
pub mod cty;
pub mod drap;
pub mod dst;
pub mod dxpeds;
pub mod kp;
pub mod onta;
pub mod scales;
pub mod solar;
pub mod solarwind;
pub mod xray;

pub mod geoip;
pub mod sdo;
pub mod spots;
pub mod worldwx;
pub mod wx;
