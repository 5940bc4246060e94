//! Durable state for the control plane: one sqlite database holding bot
//! identities, mirror paths, entitlements, and payment records.
//!
//! All cross-request coordination happens through this store. Every config
//! mutation advances the affected row's `reconcile_at` signal inside the
//! same transaction as the data change, so workers can never observe one
//! without the other.

pub mod error;
pub mod sqlite;
pub mod store;
pub mod types;

pub use {
    error::{Result, StoreError},
    sqlite::SqliteControlStore,
    store::ControlStore,
    types::{
        BotIdentity, MigrationReport, MirrorPath, NewBot, NewMirrorPath, NewRedeemItem,
        PaymentRecord, PaymentStatus, PointConfig, RedeemItem, Subscription,
    },
};
