//! SMS send/receive session: a queued outbound worker and an inbound
//! listener sharing one transport, reporting back to a UI thread.

pub mod common;
pub mod config;
pub mod network;
pub mod relay;
pub mod ui;
