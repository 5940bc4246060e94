//! Payment-provider webhook handling.
//!
//! One notification drives one per-order state machine:
//! `pending -> success | failed | challenge`, with success and failed
//! terminal. The handler verifies the provider signature before reading
//! anything else out of the payload, resolves the paid amount against the
//! price table by exact match, and applies the success path (payment record,
//! subscription reset, activation flips) through a single store transaction.

pub mod error;
pub mod notification;
pub mod order;
pub mod price;

pub use {
    error::BillingError,
    notification::{
        NotificationResult, PaymentNotification, compute_signature, handle_notification,
    },
    order::{ORDER_PREFIX, OrderRef, format_order_id, parse_order_id},
    price::{SUBSCRIPTION_PERIOD_MS, plan_for_amount, price_of},
};
