//! Placement of keys on the hash ring.

pub mod sip;
pub mod traits;

pub use sip::SipHashPartitioner;
pub use traits::Partitioner;
