//! Asset Registry - authoritative device inventory served over a message bus
//!
//! This library provides the core of the asset registry:
//! - A single-task actor with an explicit lifecycle (`Created`, `Running`,
//!   `Stopped`, `Terminated`)
//! - A device registry persisted to a TOML file
//! - Mailbox request dispatch (`INSERT`, `DELETE`, `LOOKUP`) with typed replies
//! - A bus transport boundary and an in-process broker
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   CONFIG/START/STOP/VERBOSE/$TERM
//! │    Owner     │ ───────────────────────────────┐
//! └──────────────┘                                │
//!                                                 ▼
//! ┌──────────────┐  mailbox / stream   ┌──────────────────────┐
//! │  Bus peers   │ ◀─────────────────▶ │     AssetActor       │
//! └──────────────┘                     │ dispatch ─▶ registry │
//!                                      └──────────┬───────────┘
//!                                                 │ store / load
//!                                                 ▼
//!                                           devices.toml
//! ```

pub mod actor;
pub mod bus;
pub mod config;
pub mod devices;
pub mod error;
pub mod proto;

pub use actor::{ActorState, AssetActor, AssetHandle, Command};
pub use config::AssetConfig;
pub use devices::{DeviceRecord, DeviceRegistry};
pub use error::{Error, Result};
pub use proto::ProtoMessage;
