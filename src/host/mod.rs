//! Host bridge: versioned envelopes, command router, and stdio transport.

pub mod channel;
pub mod contract;
pub mod stdio;
