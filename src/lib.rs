// Library root module for ultra-router
// This file defines the public API and module structure for the ultra-router
// library: route enumeration, batched on-chain quoting and split selection
//
// Numan Thabit 2025 Nov

pub mod config;
pub mod errors;
pub mod gas;
pub mod metrics;
pub mod quoter;
pub mod router;
pub mod transport;
