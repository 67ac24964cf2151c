//! Orders
//!
//! Turns accumulated wizard state into the backend's create-order contract.
//! Three independent branches shape the request: delivery method (shipping
//! address or none), payment method (which sub-form fields are mandatory),
//! and guest vs. authenticated (guests must ship an explicit item list and
//! identification block, since they have no server cart to dereference).
//!
//! All validation here is local and runs before any network call: the
//! receipt and payment detail fields are client-only structures that are
//! flattened into the request at submission time, so the backend never gets
//! a chance to reject them field-by-field.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    cart::LocalCart,
    checkout::form::{
        CheckoutForm, DeliveryMethod, IdentificationType, LocationInput, PaymentDetails,
        PaymentMethod, ReceiptFile,
    },
    discounts::AppliedDiscount,
};

/// Placeholder street text for coordinate-only deliveries. The backend
/// requires non-empty address strings even when only the coordinates are
/// meaningful.
pub const COORDINATES_ADDRESS: &str = "Ubicación por coordenadas";

/// Placeholder zip for coordinate-only deliveries.
pub const COORDINATES_ZIP: &str = "0000";

/// Why assembly refused to produce a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderAssemblyError {
    /// Guest orders embed contact identity; it must be complete.
    #[error("contact information is incomplete")]
    IncompleteContact,

    /// A delivery order needs a full address or coordinates.
    #[error("delivery orders require an address or coordinates")]
    MissingLocation,

    /// No payment sub-form was selected.
    #[error("no payment method selected")]
    MissingPaymentMethod,

    /// A required field of the selected payment method is blank.
    #[error("payment field {0:?} is required")]
    MissingPaymentField(&'static str),

    /// Every payment method requires exactly one attached receipt.
    #[error("a payment receipt must be attached")]
    MissingReceipt,

    /// Guests must identify themselves.
    #[error("guest orders require an identification document")]
    MissingIdentification,

    /// Guests submit their item list explicitly; an empty one is not an
    /// order.
    #[error("the cart is empty")]
    EmptyCart,
}

/// Who is placing the order.
#[derive(Debug, Clone, Copy)]
pub enum OrderParty<'a> {
    /// The backend resolves identity and items from the session-bound
    /// server cart.
    Authenticated,
    /// Anonymous shopper; the local cart is copied into the request.
    Guest { cart: &'a LocalCart },
}

/// Guest identification block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub identification_type: IdentificationType,
    pub identification_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Shipping address; for coordinate deliveries the text fields carry
/// placeholders and the coordinates carry the meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// One line of a guest order's explicit item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_uuid: Uuid,
    pub quantity: u32,
}

/// The create-order contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub delivery_method: DeliveryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_info: Option<CustomerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: PaymentMethod,
    pub payment_details: PaymentDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemInput>>,
}

/// A created order, immutable once submitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub uuid: Uuid,
    pub status: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub total_ves: Option<Decimal>,
    pub created_at: Timestamp,
}

/// A fully validated order ready for the two-phase submission: the JSON
/// request for phase one, the receipt for phase two.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub request: CreateOrderRequest,
    pub receipt: ReceiptFile,
}

/// Assembles and validates the create-order request.
///
/// # Errors
///
/// Returns an [`OrderAssemblyError`] naming the first violated requirement;
/// nothing is sent anywhere until assembly succeeds.
pub fn assemble_order(
    form: &CheckoutForm,
    party: OrderParty<'_>,
    discount: Option<&AppliedDiscount>,
) -> Result<OrderDraft, OrderAssemblyError> {
    let payment = form
        .payment
        .as_ref()
        .ok_or(OrderAssemblyError::MissingPaymentMethod)?;

    if let Some(&field) = payment.missing_fields().first() {
        return Err(OrderAssemblyError::MissingPaymentField(field));
    }

    let receipt = form
        .receipt
        .clone()
        .ok_or(OrderAssemblyError::MissingReceipt)?;

    let shipping_address = shipping_address(form)?;
    let (customer_info, items) = party_fields(form, party)?;

    Ok(OrderDraft {
        request: CreateOrderRequest {
            delivery_method: form.delivery_method,
            customer_info,
            shipping_address,
            payment_method: payment.method(),
            payment_details: payment.clone(),
            discount_code: discount.map(|applied| applied.code.clone()),
            items,
        },
        receipt,
    })
}

fn shipping_address(form: &CheckoutForm) -> Result<Option<ShippingAddress>, OrderAssemblyError> {
    match form.delivery_method {
        DeliveryMethod::Pickup => Ok(None),
        DeliveryMethod::Delivery => {
            let location = form
                .location
                .as_ref()
                .filter(|location| location.is_complete())
                .ok_or(OrderAssemblyError::MissingLocation)?;

            Ok(Some(match location {
                LocationInput::Manual { address, city, zip } => ShippingAddress {
                    address: address.clone(),
                    city: city.clone(),
                    zip: zip.clone(),
                    latitude: None,
                    longitude: None,
                },
                LocationInput::Coordinates {
                    latitude,
                    longitude,
                    ..
                } => ShippingAddress {
                    address: COORDINATES_ADDRESS.to_owned(),
                    city: COORDINATES_ADDRESS.to_owned(),
                    zip: COORDINATES_ZIP.to_owned(),
                    latitude: Some(*latitude),
                    longitude: Some(*longitude),
                },
            }))
        }
    }
}

type PartyFields = (Option<CustomerInfo>, Option<Vec<OrderItemInput>>);

fn party_fields(form: &CheckoutForm, party: OrderParty<'_>) -> Result<PartyFields, OrderAssemblyError> {
    match party {
        OrderParty::Authenticated => Ok((None, None)),
        OrderParty::Guest { cart } => {
            if cart.is_empty() {
                return Err(OrderAssemblyError::EmptyCart);
            }

            if !form.contact_complete() {
                return Err(OrderAssemblyError::IncompleteContact);
            }

            let identification = form
                .identification
                .as_ref()
                .ok_or(OrderAssemblyError::MissingIdentification)?;

            let items = cart
                .items()
                .iter()
                .map(|line| OrderItemInput {
                    product_uuid: line.product_uuid,
                    quantity: line.quantity,
                })
                .collect();

            Ok((
                Some(CustomerInfo {
                    identification_type: identification.kind,
                    identification_number: identification.number.clone(),
                    first_name: form.contact.first_name.clone(),
                    last_name: form.contact.last_name.clone(),
                    email: form.contact.email.clone(),
                    phone: form.contact.phone.clone(),
                }),
                Some(items),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::checkout::form::{
        ContactInfo, GeoSource, GuestIdentification, PagoMovilDetails, TransferenciaDetails,
        ZelleDetails,
    };
    use crate::discounts::ValidatedDiscount;

    use super::*;

    fn contact() -> ContactInfo {
        ContactInfo {
            first_name: "María".to_owned(),
            last_name: "Pérez".to_owned(),
            email: "maria@example.com".to_owned(),
            phone: "0414-1234567".to_owned(),
        }
    }

    fn receipt() -> ReceiptFile {
        ReceiptFile {
            file_name: "comprobante.jpg".to_owned(),
            content_type: "image/jpeg".to_owned(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    fn guest_id() -> GuestIdentification {
        GuestIdentification {
            kind: IdentificationType::V,
            number: "12345678".to_owned(),
        }
    }

    fn local_cart() -> TestResult<LocalCart> {
        let mut cart = LocalCart::new();

        cart.add_item(Uuid::now_v7(), 2)?;

        Ok(cart)
    }

    #[test]
    fn authenticated_pickup_zelle_omits_address_items_and_customer() -> TestResult {
        let form = CheckoutForm {
            contact: contact(),
            payment: Some(PaymentDetails::Zelle(ZelleDetails {
                sender_name: "John Pérez".to_owned(),
                sender_bank: "Bank of America".to_owned(),
            })),
            receipt: Some(receipt()),
            ..CheckoutForm::default()
        };

        let draft = assemble_order(&form, OrderParty::Authenticated, None)?;
        let json = serde_json::to_value(&draft.request)?;

        assert_eq!(json["deliveryMethod"], "pickup");
        assert_eq!(json["paymentMethod"], "zelle");
        assert_eq!(json["paymentDetails"]["senderName"], "John Pérez");
        assert_eq!(json["paymentDetails"]["senderBank"], "Bank of America");
        assert!(json.get("shippingAddress").is_none());
        assert!(json.get("items").is_none());
        assert!(json.get("customerInfo").is_none());
        assert!(json.get("discountCode").is_none());

        Ok(())
    }

    #[test]
    fn guest_delivery_manual_pagomovil_includes_everything() -> TestResult {
        let cart = local_cart()?;
        let form = CheckoutForm {
            contact: contact(),
            delivery_method: DeliveryMethod::Delivery,
            location: Some(LocationInput::Manual {
                address: "Calle 72 con Av. 3H".to_owned(),
                city: "Maracaibo".to_owned(),
                zip: "4001".to_owned(),
            }),
            payment: Some(PaymentDetails::Pagomovil(PagoMovilDetails {
                phone: "0414-1234567".to_owned(),
                cedula: "V-12345678".to_owned(),
                bank_code: "0102".to_owned(),
                reference: "00123456".to_owned(),
            })),
            receipt: Some(receipt()),
            identification: Some(guest_id()),
        };

        let draft = assemble_order(&form, OrderParty::Guest { cart: &cart }, None)?;
        let json = serde_json::to_value(&draft.request)?;

        assert_eq!(json["customerInfo"]["identificationType"], "V");
        assert_eq!(json["customerInfo"]["identificationNumber"], "12345678");
        assert_eq!(json["shippingAddress"]["address"], "Calle 72 con Av. 3H");
        assert_eq!(json["shippingAddress"]["city"], "Maracaibo");
        assert_eq!(json["shippingAddress"]["zip"], "4001");
        assert!(json["shippingAddress"].get("latitude").is_none());
        assert_eq!(json["paymentDetails"]["bankCode"], "0102");
        assert_eq!(json["paymentDetails"]["reference"], "00123456");
        assert_eq!(json["items"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["items"][0]["quantity"], 2);

        Ok(())
    }

    #[test]
    fn guest_delivery_coordinates_transferencia_uses_placeholders() -> TestResult {
        let cart = local_cart()?;
        let form = CheckoutForm {
            contact: contact(),
            delivery_method: DeliveryMethod::Delivery,
            location: Some(LocationInput::Coordinates {
                latitude: 10.48,
                longitude: -66.91,
                source: GeoSource::MapPick,
            }),
            payment: Some(PaymentDetails::Transferencia(TransferenciaDetails {
                account_holder: "María Pérez".to_owned(),
                cedula: "V-12345678".to_owned(),
                bank: "Banco de Venezuela".to_owned(),
                reference: "987654".to_owned(),
            })),
            receipt: Some(receipt()),
            identification: Some(guest_id()),
        };

        let draft = assemble_order(&form, OrderParty::Guest { cart: &cart }, None)?;
        let json = serde_json::to_value(&draft.request)?;

        assert_eq!(json["shippingAddress"]["address"], COORDINATES_ADDRESS);
        assert_eq!(json["shippingAddress"]["zip"], COORDINATES_ZIP);
        assert_eq!(json["shippingAddress"]["latitude"], 10.48);
        assert_eq!(json["shippingAddress"]["longitude"], -66.91);

        Ok(())
    }

    #[test]
    fn missing_receipt_blocks_assembly() {
        let form = CheckoutForm {
            contact: contact(),
            payment: Some(PaymentDetails::Zelle(ZelleDetails {
                sender_name: "John Pérez".to_owned(),
                sender_bank: "Bank of America".to_owned(),
            })),
            receipt: None,
            ..CheckoutForm::default()
        };

        let result = assemble_order(&form, OrderParty::Authenticated, None);

        assert_eq!(result.map(|_| ()), Err(OrderAssemblyError::MissingReceipt));
    }

    #[test]
    fn blank_payment_field_is_named_in_the_error() {
        let form = CheckoutForm {
            contact: contact(),
            payment: Some(PaymentDetails::Pagomovil(PagoMovilDetails {
                phone: "0414-1234567".to_owned(),
                cedula: String::new(),
                bank_code: "0102".to_owned(),
                reference: "00123456".to_owned(),
            })),
            receipt: Some(receipt()),
            ..CheckoutForm::default()
        };

        let result = assemble_order(&form, OrderParty::Authenticated, None);

        assert_eq!(
            result.map(|_| ()),
            Err(OrderAssemblyError::MissingPaymentField("cedula"))
        );
    }

    #[test]
    fn delivery_without_location_is_refused() {
        let form = CheckoutForm {
            contact: contact(),
            delivery_method: DeliveryMethod::Delivery,
            payment: Some(PaymentDetails::Zelle(ZelleDetails {
                sender_name: "John Pérez".to_owned(),
                sender_bank: "Bank of America".to_owned(),
            })),
            receipt: Some(receipt()),
            ..CheckoutForm::default()
        };

        let result = assemble_order(&form, OrderParty::Authenticated, None);

        assert_eq!(result.map(|_| ()), Err(OrderAssemblyError::MissingLocation));
    }

    #[test]
    fn guest_without_identification_is_refused() -> TestResult {
        let cart = local_cart()?;
        let form = CheckoutForm {
            contact: contact(),
            payment: Some(PaymentDetails::Zelle(ZelleDetails {
                sender_name: "John Pérez".to_owned(),
                sender_bank: "Bank of America".to_owned(),
            })),
            receipt: Some(receipt()),
            ..CheckoutForm::default()
        };

        let result = assemble_order(&form, OrderParty::Guest { cart: &cart }, None);

        assert_eq!(
            result.map(|_| ()),
            Err(OrderAssemblyError::MissingIdentification)
        );

        Ok(())
    }

    #[test]
    fn guest_with_empty_cart_is_refused() {
        let cart = LocalCart::new();
        let form = CheckoutForm {
            contact: contact(),
            payment: Some(PaymentDetails::Zelle(ZelleDetails {
                sender_name: "John Pérez".to_owned(),
                sender_bank: "Bank of America".to_owned(),
            })),
            receipt: Some(receipt()),
            identification: Some(guest_id()),
            ..CheckoutForm::default()
        };

        let result = assemble_order(&form, OrderParty::Guest { cart: &cart }, None);

        assert_eq!(result.map(|_| ()), Err(OrderAssemblyError::EmptyCart));
    }

    #[test]
    fn applied_discount_code_rides_along() -> TestResult {
        let applied = crate::discounts::AppliedDiscount::bind(
            ValidatedDiscount {
                code: "SAVE10".to_owned(),
                amount_usd: "10".parse()?,
                amount_ves: None,
            },
            "100".parse()?,
        );

        let form = CheckoutForm {
            contact: contact(),
            payment: Some(PaymentDetails::Zelle(ZelleDetails {
                sender_name: "John Pérez".to_owned(),
                sender_bank: "Bank of America".to_owned(),
            })),
            receipt: Some(receipt()),
            ..CheckoutForm::default()
        };

        let draft = assemble_order(&form, OrderParty::Authenticated, Some(&applied))?;

        assert_eq!(draft.request.discount_code.as_deref(), Some("SAVE10"));

        Ok(())
    }
}
