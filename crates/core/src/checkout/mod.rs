//! Checkout
//!
//! The wizard's form state and the delivery-method-dependent step machine.

pub mod form;
pub mod steps;

pub use form::*;
pub use steps::*;
