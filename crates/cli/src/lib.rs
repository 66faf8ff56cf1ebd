//! HTTP front end for the ledger runtime.

pub mod cli;
pub mod error;
pub mod logging;
pub mod routes;
pub mod server;
pub mod shutdown;
