//! Smart Dispenser kernel
//!
//! - `qr`: classify scanned provisioning payloads (WiFi, device JSON, bare IP)
//! - `notify`: turn backend alerts into deduplicated platform notification requests
//! - `mqtt` / `http`: the alert feed and REST surface around both

pub mod config;
pub mod health;
pub mod http;
pub mod models;
pub mod mqtt;
pub mod notify;
pub mod qr;
