//! Wire types shared by the ledger runtime and the HTTP gateway.
//!
//! # Main Types
//!
//! - [`NetworkProfile`] - Connection profile document describing peers, CAs and orderers
//! - [`Identity`] - Wallet identity file (`<label>.id`)
//! - [`Asset`] - Record stored by the asset-tracking chaincode
//! - [`CreateAssetBody`] / [`UpdateAssetBody`] - HTTP request bodies
//! - [`wire`] - Request/response frames spoken with a peer gateway

pub mod asset;
pub mod identity;
pub mod profile;
pub mod wire;

pub use asset::{Asset, CreateAssetBody, DecimalArg, UpdateAssetBody};
pub use identity::{Credentials, Identity};
pub use profile::{EndpointDescriptor, NetworkProfile};
