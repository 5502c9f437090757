//! Device connection flow of a fitness tracker: scan for devices, let the user pick one,
//! simulate pairing, then hand over to the dashboard.

pub mod collaborators;
pub mod configuration;
pub mod device;
pub mod error;
pub mod flow;
pub mod log;
pub mod notification;
pub mod serde_ext;
