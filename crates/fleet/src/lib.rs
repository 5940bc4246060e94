//! Fleet coordination as seen from both sides of the store.
//!
//! The control plane never talks to a worker directly. Workers poll the
//! store on their own timer, compare the reconcile signal to the last value
//! they applied, and reload when it moved; they write a heartbeat after
//! every successful cycle. This crate holds that pull contract: liveness
//! derivation, signal comparison, and snapshot loaders that hand a worker
//! its full configuration with credentials already opened.

pub mod error;
pub mod liveness;
pub mod snapshot;
pub mod status;

pub use {
    error::FleetError,
    liveness::{RECOMMENDED_POLL_INTERVAL_MS, STALE_WINDOW_MS, is_online, needs_reload},
    snapshot::{BotSnapshot, MirrorSnapshot, MirrorSource, load_bot_snapshot, load_mirror_snapshot},
    status::{FleetStatus, fleet_status},
};
