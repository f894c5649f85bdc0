//! # Stripe tools
//!
//! A small client for the parts of the Stripe API that the storefront gateway needs:
//!
//! * [`StripeApi`] creates payment intents (charges), tagged with an idempotency key.
//! * [`webhook`] verifies the `Stripe-Signature` header on inbound webhook calls and decodes the event payload.
//!
//! This crate knows nothing about orders. The glue between Stripe and the order engine lives in the server.
mod api;
mod config;
mod error;

pub mod data_objects;
pub mod webhook;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{PaymentIntent, StripeEvent};
pub use error::{StripeApiError, WebhookError};
