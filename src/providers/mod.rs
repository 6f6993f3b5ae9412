//! Upstream rate providers and the routing composite.

pub mod crypto;
pub mod fiat;
pub mod mock;
pub mod router;
