//! Checkout steps
//!
//! The wizard's step list is a function of the delivery method, not a fixed
//! array: pickup orders never see the Location step. Forward navigation is
//! gated per step; backward navigation is unconditional and, because the
//! list itself omits Location for pickup, stepping back from Payment lands
//! on Delivery without any special casing.

use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use super::form::{CheckoutForm, DeliveryMethod};

/// The wizard's steps, in order of appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Contact identity. Always first.
    Contact,
    /// Pickup-or-delivery selection.
    Delivery,
    /// Address or coordinates. Present only for delivery orders.
    Location,
    /// Payment sub-form and submission. Always last.
    Payment,
}

/// The step list, ≤ 4 entries.
pub type StepSequence = SmallVec<[Step; 4]>;

/// Why forward navigation was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    /// Contact requires first name, last name, email and phone.
    #[error("contact step is incomplete")]
    IncompleteContact,

    /// Location requires a full manual address or coordinates.
    #[error("location step is incomplete")]
    IncompleteLocation,

    /// Payment is terminal: the order is submitted from it, not advanced
    /// past.
    #[error("already at the payment step")]
    FinalStep,
}

/// Computes the ordered step list for a delivery method.
#[must_use]
pub fn step_sequence(method: DeliveryMethod) -> StepSequence {
    match method {
        DeliveryMethod::Pickup => smallvec![Step::Contact, Step::Delivery, Step::Payment],
        DeliveryMethod::Delivery => smallvec![
            Step::Contact,
            Step::Delivery,
            Step::Location,
            Step::Payment,
        ],
    }
}

/// Tracks the shopper's position in the wizard.
///
/// The delivery method is mirrored from the form on every [`advance`] call,
/// so a method change made on the Delivery step reshapes the remaining
/// sequence before the next transition is evaluated.
///
/// [`advance`]: CheckoutWizard::advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutWizard {
    index: usize,
    method: DeliveryMethod,
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutWizard {
    /// Starts at Contact with the default delivery method (pickup).
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: 0,
            method: DeliveryMethod::default(),
        }
    }

    #[must_use]
    pub fn steps(&self) -> StepSequence {
        step_sequence(self.method)
    }

    #[must_use]
    pub fn step_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current_step(&self) -> Step {
        self.steps()
            .get(self.index)
            .copied()
            .unwrap_or(Step::Payment)
    }

    #[must_use]
    pub fn is_final_step(&self) -> bool {
        self.index + 1 == self.steps().len()
    }

    /// Changes the delivery method, reshaping the step list. The index is
    /// clamped so the wizard never points past the new final step.
    pub fn set_delivery_method(&mut self, method: DeliveryMethod) {
        self.method = method;
        self.index = self.index.min(self.steps().len() - 1);
    }

    /// Validates the current step against the form and moves forward.
    ///
    /// # Errors
    ///
    /// Returns the step's gate error when its required fields are missing,
    /// or [`StepError::FinalStep`] from the Payment step.
    pub fn advance(&mut self, form: &CheckoutForm) -> Result<Step, StepError> {
        self.set_delivery_method(form.delivery_method);

        match self.current_step() {
            Step::Contact if !form.contact_complete() => Err(StepError::IncompleteContact),
            Step::Location if !form.location_complete() => Err(StepError::IncompleteLocation),
            Step::Payment => Err(StepError::FinalStep),
            Step::Contact | Step::Delivery | Step::Location => {
                self.index += 1;

                Ok(self.current_step())
            }
        }
    }

    /// Moves back one step, unconditionally. Saturates at Contact.
    pub fn back(&mut self) -> Step {
        self.index = self.index.saturating_sub(1);

        self.current_step()
    }
}
