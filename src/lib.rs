/* src/lib.rs */

//! A fan-out proxy that shields clients from unreliable Esplora-style Bitcoin
//! data providers. Requests are served from a short-lived cache, and misses
//! fail over across the configured upstreams in priority order behind one
//! shared rate gate.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod operations;
pub mod payload;
pub mod ratelimit;
pub mod routing;
pub mod signature;
pub mod state;
pub mod transport;
pub mod upstream;
