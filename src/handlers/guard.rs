// src/handlers/guard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::CurrentAccess, i18n::Locale},
    models::guard::{
        ActionAttempt, CashRegisterView, DenialReason, ModalPrompt, SensitiveAction, ShiftView,
    },
    services::guard_gate,
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: tentativa de ação sensível
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GateCheckPayload {
    #[schema(example = "PAYMENT")]
    pub action: SensitiveAction,

    pub order_id: Option<Uuid>,

    #[serde(default)]
    pub kitchen_order_sent: bool,

    #[validate(range(min = 0, message = "A quantidade de itens não pode ser negativa."))]
    #[serde(default)]
    pub item_count: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(example = "120.50")]
    pub subtotal: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(example = "132.55")]
    pub total: Decimal,
}

impl From<GateCheckPayload> for ActionAttempt {
    fn from(payload: GateCheckPayload) -> Self {
        ActionAttempt {
            action: payload.action,
            order_id: payload.order_id,
            kitchen_order_sent: payload.kitchen_order_sent,
            item_count: payload.item_count,
            subtotal: payload.subtotal,
            total: payload.total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GateCheckResponse {
    pub allowed: bool,
    /// Chamada repetida dentro da janela de debounce; nada foi decidido.
    pub debounced: bool,
    pub reason: Option<DenialReason>,
    pub modal: Option<ModalPrompt>,
}

impl GateCheckResponse {
    fn debounced() -> Self {
        Self { allowed: false, debounced: true, reason: None, modal: None }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuardStatusResponse {
    pub shift: ShiftView,
    pub cash_register: CashRegisterView,
}

// =============================================================================
//  CONSULTAS
// =============================================================================

// GET /api/guard/shift
#[utoipa::path(
    get,
    path = "/api/guard/shift",
    tag = "Guard",
    responses(
        (status = 200, description = "Turno do ator no dia", body = ShiftView),
        (status = 401, description = "Token inválido"),
        (status = 403, description = "Usuário sem vínculo com o restaurante")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do Restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_shift_status(
    State(app_state): State<AppState>,
    CurrentAccess(access): CurrentAccess,
) -> Result<impl IntoResponse, AppError> {
    let guard = app_state.guard_registry.mount(access).await;
    guard.refresh_if_stale().await;

    Ok(Json(guard.shift_view()))
}

// GET /api/guard/cash-register
#[utoipa::path(
    get,
    path = "/api/guard/cash-register",
    tag = "Guard",
    responses(
        (status = 200, description = "Caixa do restaurante no dia", body = CashRegisterView),
        (status = 401, description = "Token inválido"),
        (status = 403, description = "Usuário sem vínculo com o restaurante")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do Restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cash_register_status(
    State(app_state): State<AppState>,
    CurrentAccess(access): CurrentAccess,
) -> Result<impl IntoResponse, AppError> {
    let guard = app_state.guard_registry.mount(access).await;
    guard.refresh_if_stale().await;

    Ok(Json(guard.cash_register_view()))
}

// POST /api/guard/refresh
#[utoipa::path(
    post,
    path = "/api/guard/refresh",
    tag = "Guard",
    responses(
        (status = 200, description = "Status relidos", body = GuardStatusResponse),
        (status = 403, description = "Usuário sem vínculo com o restaurante")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do Restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    CurrentAccess(access): CurrentAccess,
) -> Result<impl IntoResponse, AppError> {
    let guard = app_state.guard_registry.mount(access).await;
    guard.refresh().await;

    Ok(Json(GuardStatusResponse {
        shift: guard.shift_view(),
        cash_register: guard.cash_register_view(),
    }))
}

// =============================================================================
//  GATE
// =============================================================================

// POST /api/guard/check
#[utoipa::path(
    post,
    path = "/api/guard/check",
    tag = "Guard",
    request_body = GateCheckPayload,
    responses(
        (status = 200, description = "Decisão do guard", body = GateCheckResponse),
        (status = 400, description = "Payload inválido"),
        (status = 403, description = "Usuário sem vínculo com o restaurante")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do Restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn check(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentAccess(access): CurrentAccess,
    Json(payload): Json<GateCheckPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let attempt = ActionAttempt::from(payload);
    let order_key = attempt
        .order_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let debounce_key = format!(
        "{}:{}:{}:{}",
        access.restaurant_id,
        access.actor.id,
        attempt.action.as_code(),
        order_key
    );

    let guard = app_state.guard_registry.mount(access).await;

    let response = app_state
        .debouncer
        .call_or_else(
            &debounce_key,
            || async {
                let decision = guard.check(&attempt).await;
                let reason = decision.reason();
                GateCheckResponse {
                    allowed: decision.is_allowed(),
                    debounced: false,
                    reason,
                    modal: reason.map(|r| guard_gate::modal_for(r, &locale.0)),
                }
            },
            GateCheckResponse::debounced,
        )
        .await;

    Ok(Json(response))
}

// DELETE /api/guard/session
#[utoipa::path(
    delete,
    path = "/api/guard/session",
    tag = "Guard",
    responses(
        (status = 204, description = "Guard desmontado (logout)")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do Restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn end_session(
    State(app_state): State<AppState>,
    CurrentAccess(access): CurrentAccess,
) -> Result<impl IntoResponse, AppError> {
    let (restaurant_id, actor_id) = (access.restaurant_id, access.actor.id);
    let removed = app_state.guard_registry.unmount(restaurant_id, actor_id);
    tracing::info!(%actor_id, %restaurant_id, removed, "Sessão do guard encerrada");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> GateCheckPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_payload_defaults_and_conversion() {
        let order_id = Uuid::new_v4();
        let parsed = payload(serde_json::json!({
            "action": "PAYMENT",
            "orderId": order_id,
            "itemCount": 3,
            "subtotal": 100.0,
            "total": 110.0
        }));
        assert!(parsed.validate().is_ok());

        let attempt = ActionAttempt::from(parsed);
        assert_eq!(attempt.action, SensitiveAction::Payment);
        assert_eq!(attempt.order_id, Some(order_id));
        assert!(!attempt.kitchen_order_sent);
        assert_eq!(attempt.item_count, 3);
        assert_eq!(attempt.total, Decimal::new(110, 0));
    }

    #[test]
    fn test_negative_amounts_are_rejected() {
        let parsed = payload(serde_json::json!({
            "action": "KITCHEN_ORDER",
            "itemCount": -1,
            "subtotal": -5.0,
            "total": 0.0
        }));

        let errors = parsed.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("item_count"));
        assert!(fields.contains_key("subtotal"));
        assert!(!fields.contains_key("total"));
    }

    #[test]
    fn test_debounced_response_shape() {
        let body = serde_json::to_value(GateCheckResponse::debounced()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "allowed": false,
                "debounced": true,
                "reason": null,
                "modal": null
            })
        );
    }
}
