//! Client-side runtime for the ledger asset gateway.
//!
//! Resolves connection parameters from the environment, loads the network
//! profile and wallet, and keeps one lazily opened session to the ledger
//! network through [`SessionManager`]. The network itself is reached through
//! the [`Gateway`] seam: [`PeerGateway`] for a real peer, [`MemoryGateway`]
//! for an in-process ledger.

pub mod assets;
pub mod config;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod peer;
pub mod profile;
pub mod session;
pub mod transport;
pub mod wallet;

pub use assets::{AssetContract, CreateAssetArgs, UpdateAssetArgs, normalize_asset_list};
pub use config::{ConfigResolver, ConnectionConfig, ProcessEnv};
pub use error::{Error, Result};
pub use gateway::{ConnectOptions, Contract, DiscoveryOptions, Gateway, IdentityStore, LedgerConnection, Network, TransactionHandle};
pub use memory::MemoryGateway;
pub use peer::PeerGateway;
pub use profile::{load_profile, rewrite_host};
pub use session::{SessionManager, SessionState};
pub use wallet::FileSystemWallet;
