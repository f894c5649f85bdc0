//! Types shared by every crate in the storefront gateway workspace.
//!
//! * [`Amount`] is the exact decimal money type used for catalog prices and order totals.
//! * [`MinorUnits`] is the integer representation (e.g. cents) that is sent to the card processor.
//! * [`Secret`] wraps configuration values that must never end up in logs.
mod amount;

pub mod helpers;
mod secret;

pub use amount::{Amount, AmountConversionError, MinorUnits, CURRENCY_CODE, CURRENCY_CODE_LOWER, MINOR_UNIT_DIGITS};
pub use secret::Secret;
