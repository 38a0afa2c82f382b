//! # Request Handlers
//!
//! Axum request handlers for checkout, payment creation, and the
//! provider webhook. All errors are mapped at this boundary to a uniform
//! `{status:"error", message}` envelope.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{CheckoutRequest, OrderSummary, PaymentProvider, ShopError};
use shop_pay::PaymentHandle;
use tracing::{error, instrument};
use uuid::Uuid;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Uniform error envelope
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
}

/// `Json` with its rejections mapped to the uniform error envelope.
///
/// The stock extractor answers malformed bodies in plain text before the
/// handler runs; every error leaving this API must carry
/// `{status:"error", message}`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = (StatusCode, Json<ErrorEnvelope>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorEnvelope {
                    status: "error",
                    message: rejection.body_text(),
                }),
            )),
        }
    }
}

/// Successful checkout response
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub order: OrderSummary,
}

/// Start-payment request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Order fields echoed back by the payment endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderView {
    pub id: Uuid,
    pub code: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Start-payment response: either a client secret or a redirect URL
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub status: &'static str,
    pub provider: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishable_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub order: PaymentOrderView,
}

/// Map a domain error to the wire envelope. Internal detail is suppressed
/// for 5xx responses outside development.
fn error_response(state: &AppState, err: ShopError) -> (StatusCode, Json<ErrorEnvelope>) {
    let code = err.status_code();
    let message = if code >= 500 && state.config.is_production() {
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorEnvelope {
            status: "error",
            message,
        }),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "shop-checkout",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
    }))
}

/// Create an order from a guest cart submission
#[instrument(skip(state, request), fields(items = request.items.len()))]
pub async fn create_checkout(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), (StatusCode, Json<ErrorEnvelope>)> {
    let summary = state
        .checkout
        .create_checkout(request)
        .await
        .map_err(|e| error_response(&state, e))?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            status: "success",
            message: "Order created",
            order: summary,
        }),
    ))
}

/// Start a payment for an existing order
#[instrument(skip(state, request))]
pub async fn create_payment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreatePaymentRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorEnvelope>)> {
    let provider = request
        .provider
        .as_deref()
        .and_then(PaymentProvider::parse)
        .ok_or_else(|| {
            error_response(
                &state,
                ShopError::InvalidProvider {
                    provider: request.provider.clone().unwrap_or_default(),
                },
            )
        })?;

    let order_id = match request.order_id.as_deref() {
        None => {
            return Err(error_response(
                &state,
                ShopError::MissingField { field: "orderId" },
            ))
        }
        // An id that cannot be parsed can never resolve to an order.
        Some(raw) => Uuid::parse_str(raw).map_err(|_| {
            error_response(
                &state,
                ShopError::OrderNotFound {
                    order_id: raw.to_string(),
                },
            )
        })?,
    };

    let (handle, order) = state
        .gateway
        .start_payment(provider, order_id)
        .await
        .map_err(|e| {
            error!("Failed to start payment: {e}");
            error_response(&state, e)
        })?;

    let order_view = PaymentOrderView {
        id: order.id,
        code: order.code.clone(),
        amount_minor: order.amount_minor,
        currency: order.currency.clone(),
    };

    let response = match handle {
        PaymentHandle::AlreadyPaid => serde_json::json!({
            "status": "success",
            "message": "Already paid",
        }),
        PaymentHandle::ClientSecret {
            client_secret,
            publishable_key,
        } => serde_json::to_value(CreatePaymentResponse {
            status: "success",
            provider: provider.as_str(),
            kind: "clientSecret",
            client_secret: Some(client_secret),
            publishable_key: Some(publishable_key),
            redirect_url: None,
            order: order_view,
        })
        .map_err(|e| error_response(&state, ShopError::Serialization(e.to_string())))?,
        PaymentHandle::RedirectUrl { redirect_url } => {
            serde_json::to_value(CreatePaymentResponse {
                status: "success",
                provider: provider.as_str(),
                kind: "redirectUrl",
                client_secret: None,
                publishable_key: None,
                redirect_url: Some(redirect_url),
                order: order_view,
            })
            .map_err(|e| error_response(&state, ShopError::Serialization(e.to_string())))?
        }
    };

    Ok(Json(response))
}

/// Handle a provider webhook delivery.
///
/// This route receives the raw body bytes; signature verification is
/// byte-sensitive and must run before any JSON parsing.
#[instrument(skip(state, headers, body), fields(provider = %provider))]
pub async fn provider_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorEnvelope>)> {
    let provider = PaymentProvider::parse(&provider).ok_or_else(|| {
        error_response(&state, ShopError::InvalidProvider { provider })
    })?;

    let signature = headers
        .get("webhook-signature")
        .and_then(|v| v.to_str().ok());

    state
        .reconciler
        .handle_event(provider, &body, signature)
        .await
        .map_err(|e| {
            error!("Webhook rejected: {e}");
            error_response(&state, e)
        })?;

    Ok(Json(serde_json::json!({ "received": true })))
}
