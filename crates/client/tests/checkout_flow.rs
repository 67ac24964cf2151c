//! End-to-end checkout against a mock backend: anonymous cart, login-time
//! merge, discount application, and the two-phase order submission, all
//! through the real HTTP clients.

use testresult::TestResult;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bodegon_client::api::AccessToken;
use bodegon_client::checkout::Submission;
use bodegon_client::config::ClientConfig;
use bodegon_client::context::StoreContext;
use bodegon_client::session::SyncOutcome;
use bodegon_client::storage::{CartStorage, JsonFileStorage};
use bodegon_core::checkout::form::{
    ContactInfo, DeliveryMethod, GuestIdentification, IdentificationType, LocationInput,
    PagoMovilDetails, PaymentDetails, ReceiptFile,
};
use bodegon_core::discounts::DiscountOutcome;

const PRODUCT_UUID: &str = "0192e7a0-0000-7000-8000-000000000001";
const ORDER_UUID: &str = "0192e7a0-0000-7000-8000-0000000000ff";

fn server_cart_json(product_uuid: &str, quantity: u32, subtotal: &str) -> serde_json::Value {
    serde_json::json!({
        "uuid": "0192e7a0-0000-7000-8000-00000000000a",
        "items": [{
            "uuid": "0192e7a0-0000-7000-8000-00000000000b",
            "productUuid": product_uuid,
            "quantity": quantity,
            "unitPrice": "2.50",
            "subtotal": subtotal,
            "createdAt": "2024-11-05T12:00:00Z",
            "updatedAt": "2024-11-05T12:00:00Z",
        }],
        "subtotal": subtotal,
        "createdAt": "2024-11-05T12:00:00Z",
        "updatedAt": "2024-11-05T12:00:00Z",
    })
}

async fn context(server: &MockServer) -> TestResult<(StoreContext, tempfile::TempDir)> {
    let dir = tempfile::tempdir()?;
    let config = ClientConfig::new(server.uri(), dir.path().join("cart.json"));

    Ok((StoreContext::from_config(&config)?, dir))
}

#[tokio::test]
async fn guest_cart_merges_on_login_and_checks_out() -> TestResult {
    let server = MockServer::start().await;
    let (ctx, _dir) = context(&server).await?;
    let product_uuid: Uuid = PRODUCT_UUID.parse()?;

    Mock::given(method("POST"))
        .and(path("/cart/sync"))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_partial_json(serde_json::json!({
            "items": [{ "productUuid": PRODUCT_UUID, "quantity": 4 }],
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(server_cart_json(PRODUCT_UUID, 4, "10.00")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/exchange-rate/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "rate": "36.50",
            "date": "2024-11-05",
            "source": "BCV",
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/discounts/validate"))
        .and(query_param("code", "SAVE10"))
        .and(query_param("orderTotal", "10.00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "valid": true,
            "discountAmount": "1.00",
            "discountAmountVes": "36.50",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(serde_json::json!({
            "deliveryMethod": "delivery",
            "paymentMethod": "pagomovil",
            "discountCode": "SAVE10",
            "shippingAddress": { "city": "Maracaibo" },
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "uuid": ORDER_UUID,
            "status": "pending",
            "total": "9.00",
            "totalVes": "328.50",
            "createdAt": "2024-11-05T15:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/orders/{ORDER_UUID}/receipt")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uuid": ORDER_UUID,
            "status": "paid",
            "total": "9.00",
            "totalVes": "328.50",
            "createdAt": "2024-11-05T15:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    // Anonymous shopping: two adds merge into one durable line.
    let mut session = ctx.cart_session()?;

    session.add_item(product_uuid, 1).await?;
    session.add_item(product_uuid, 3).await?;

    assert_eq!(session.total_items(), 4);
    assert!(!session.is_authenticated());

    // Login folds the local cart into the server cart and destroys it.
    let outcome = session.login(AccessToken::new("tok-123")).await?;

    assert!(matches!(outcome, SyncOutcome::Merged));
    assert!(session.is_authenticated());
    assert_eq!(session.total_items(), 4);

    // Checkout: delivery order paid by Pago Móvil with a discount.
    let mut flow = ctx.checkout().await;

    let applied = flow.apply_discount(&session, "save10").await?;

    assert!(matches!(applied, DiscountOutcome::Valid(_)));

    let totals = flow.totals(&session).await?;

    assert_eq!(totals.subtotal_usd, "10.00".parse()?);
    assert_eq!(totals.discount_usd, "1.00".parse()?);
    assert_eq!(totals.total_usd, "9.00".parse()?);
    assert_eq!(totals.subtotal_ves, Some("365.00".parse()?));
    assert_eq!(totals.total_ves, Some("328.50".parse()?));

    flow.form.contact = ContactInfo {
        first_name: "María".to_owned(),
        last_name: "Pérez".to_owned(),
        email: "maria@example.com".to_owned(),
        phone: "0414-1234567".to_owned(),
    };
    flow.form.delivery_method = DeliveryMethod::Delivery;
    flow.form.location = Some(LocationInput::Manual {
        address: "Calle 72 con Av. 3H".to_owned(),
        city: "Maracaibo".to_owned(),
        zip: "4001".to_owned(),
    });
    flow.form.payment = Some(PaymentDetails::Pagomovil(PagoMovilDetails {
        phone: "0414-1234567".to_owned(),
        cedula: "V-12345678".to_owned(),
        bank_code: "0102".to_owned(),
        reference: "00123456".to_owned(),
    }));
    flow.form.receipt = Some(ReceiptFile {
        file_name: "comprobante.jpg".to_owned(),
        content_type: "image/jpeg".to_owned(),
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
    });
    flow.form.identification = Some(GuestIdentification {
        kind: IdentificationType::V,
        number: "12345678".to_owned(),
    });

    flow.advance()?;
    flow.advance()?;
    flow.advance()?;

    let submission = flow.submit(&mut session).await?;

    let Submission::Completed(order) = submission else {
        panic!("expected a completed submission, got {submission:?}");
    };

    assert_eq!(order.status, "paid");
    assert_eq!(session.total_items(), 0);

    Ok(())
}

#[tokio::test]
async fn anonymous_cart_survives_a_restart() -> TestResult {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("cart.json");
    let product_uuid: Uuid = PRODUCT_UUID.parse()?;

    {
        let config = ClientConfig::new(server.uri(), path.clone());
        let ctx = StoreContext::from_config(&config)?;
        let mut session = ctx.cart_session()?;

        session.add_item(product_uuid, 2).await?;
    }

    // A fresh context over the same path sees the same cart.
    let storage = JsonFileStorage::new(path);

    assert_eq!(storage.load()?.item_quantity(product_uuid), 2);

    Ok(())
}

#[tokio::test]
async fn failed_sync_surfaces_but_keeps_shopping_possible() -> TestResult {
    let server = MockServer::start().await;
    let (ctx, _dir) = context(&server).await?;
    let product_uuid: Uuid = PRODUCT_UUID.parse()?;

    Mock::given(method("POST"))
        .and(path("/cart/sync"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uuid": "0192e7a0-0000-7000-8000-00000000000a",
            "items": [],
            "subtotal": "0.00",
            "createdAt": "2024-11-05T12:00:00Z",
            "updatedAt": "2024-11-05T12:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ctx.cart_session()?;

    session.add_item(product_uuid, 2).await?;

    let outcome = session.login(AccessToken::new("tok")).await?;

    assert!(matches!(outcome, SyncOutcome::Failed(_)));
    assert!(session.is_authenticated());

    // The local cart survives for the next login to retry.
    assert_eq!(ctx.storage.load()?.item_quantity(product_uuid), 2);

    Ok(())
}
