//! # Storefront gateway server
//! This crate hosts the HTTP surface of the storefront order gateway. It is responsible for:
//! * Accepting purchase requests from authenticated users and handing them to the order engine.
//! * Receiving Stripe webhook calls and passing them to the reconciliation listener.
//! * Giving operators access to the reconciliation queue and the sales report.
//!
//! Users are authenticated upstream. The authenticated user id arrives in the `X-Authenticated-User` header.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /api/purchase`: Buy a list of products.
//! * `GET /api/purchase-history`: The caller's orders, newest first.
//! * `GET /api/orders/{id}`: One of the caller's orders, with its line items and status history.
//! * `POST /webhook/stripe`: Stripe payment intent notifications.
//! * `GET /ops/reconciliation`: Outstanding reconciliation entries.
//! * `POST /ops/reconciliation/replay`: Re-apply unmatched notifications whose orders now exist.
//! * `POST /ops/reconciliation/{id}/resolve`: Mark a reconciliation entry as handled.
//! * `GET /ops/sales?from=&to=&user_id=`: Units sold and revenue per product.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod hooks;
pub mod identity;
pub mod integrations;
pub mod reconciliation_monitor;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
