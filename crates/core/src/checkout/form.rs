//! Checkout form state
//!
//! A single superset of every field the wizard can collect, across all
//! steps and payment methods. Which subset must be populated is decided by
//! the step gates ([`super::steps`]) and by order assembly
//! ([`crate::orders`]).

use serde::{Deserialize, Serialize};

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Customer collects at the store. No location step, no shipping
    /// address in the order.
    #[default]
    Pickup,
    /// Courier delivery. Requires a location: either a manual postal
    /// address or device/map coordinates.
    Delivery,
}

/// Contact identity collected on the first step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl ContactInfo {
    /// All four fields non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.first_name, &self.last_name, &self.email, &self.phone]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Where geographic coordinates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoSource {
    DeviceGeolocation,
    MapPick,
}

/// The location for a delivery order. The two variants are mutually
/// exclusive input modes the customer chooses between, never combined.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    Manual {
        address: String,
        city: String,
        zip: String,
    },
    Coordinates {
        latitude: f64,
        longitude: f64,
        source: GeoSource,
    },
}

impl LocationInput {
    /// Whether this input satisfies the location gate: a full manual
    /// address, or coordinates (complete by construction).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Manual { address, city, zip } => [address, city, zip]
                .iter()
                .all(|field| !field.trim().is_empty()),
            Self::Coordinates { .. } => true,
        }
    }
}

/// The payment rails the store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Zelle,
    Pagomovil,
    Transferencia,
}

/// Zelle transfer details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZelleDetails {
    pub sender_name: String,
    pub sender_bank: String,
}

/// Pago Móvil details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagoMovilDetails {
    pub phone: String,
    pub cedula: String,
    pub bank_code: String,
    pub reference: String,
}

/// Bank transfer details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferenciaDetails {
    pub account_holder: String,
    pub cedula: String,
    pub bank: String,
    pub reference: String,
}

/// The selected payment method's sub-form. Exactly one variant is collected,
/// chosen by the method discriminator; each serializes as a flat field map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentDetails {
    Zelle(ZelleDetails),
    Pagomovil(PagoMovilDetails),
    Transferencia(TransferenciaDetails),
}

impl PaymentDetails {
    /// The discriminator for these details.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        match self {
            Self::Zelle(_) => PaymentMethod::Zelle,
            Self::Pagomovil(_) => PaymentMethod::Pagomovil,
            Self::Transferencia(_) => PaymentMethod::Transferencia,
        }
    }

    /// Names of required fields that are still blank, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let fields: Vec<(&'static str, &str)> = match self {
            Self::Zelle(details) => vec![
                ("senderName", &details.sender_name),
                ("senderBank", &details.sender_bank),
            ],
            Self::Pagomovil(details) => vec![
                ("phone", &details.phone),
                ("cedula", &details.cedula),
                ("bankCode", &details.bank_code),
                ("reference", &details.reference),
            ],
            Self::Transferencia(details) => vec![
                ("accountHolder", &details.account_holder),
                ("cedula", &details.cedula),
                ("bank", &details.bank),
                ("reference", &details.reference),
            ],
        };

        fields
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Venezuelan identification document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentificationType {
    V,
    E,
    J,
    P,
}

/// Identification collected from guests only; authenticated orders resolve
/// identity from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestIdentification {
    pub kind: IdentificationType,
    pub number: String,
}

/// The proof-of-payment file attached to the payment sub-form. Uploaded as
/// a second call after order creation, never embedded in the order JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Accumulated wizard state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutForm {
    pub contact: ContactInfo,
    pub delivery_method: DeliveryMethod,
    /// Populated only when `delivery_method` requires a location.
    pub location: Option<LocationInput>,
    /// The selected method's sub-form; `None` until the customer picks one.
    pub payment: Option<PaymentDetails>,
    /// Collected separately from the payment fields and attached at
    /// submission time.
    pub receipt: Option<ReceiptFile>,
    /// Guests only.
    pub identification: Option<GuestIdentification>,
}

impl CheckoutForm {
    #[must_use]
    pub fn contact_complete(&self) -> bool {
        self.contact.is_complete()
    }

    /// Whether the location gate passes for the current delivery method.
    /// Pickup needs no location at all.
    #[must_use]
    pub fn location_complete(&self) -> bool {
        match self.delivery_method {
            DeliveryMethod::Pickup => true,
            DeliveryMethod::Delivery => self
                .location
                .as_ref()
                .is_some_and(LocationInput::is_complete),
        }
    }
}
