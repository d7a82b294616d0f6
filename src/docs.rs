// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use crate::handlers;
use crate::models;

const BEARER_SCHEME: &str = "api_jwt";

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Guard ---
        handlers::guard::get_shift_status,
        handlers::guard::get_cash_register_status,
        handlers::guard::refresh,
        handlers::guard::check,
        handlers::guard::end_session,
    ),
    components(
        schemas(
            // --- Guard ---
            models::guard::ActorRole,
            models::guard::SensitiveAction,
            models::guard::DenialReason,
            models::guard::ShiftView,
            models::guard::CashRegisterView,
            models::guard::ModalPrompt,

            // --- Dados de origem ---
            models::attendance::ClockType,
            models::attendance::AttendanceRecord,
            models::cash_register::CashRegisterSession,

            // --- Payloads ---
            handlers::guard::GateCheckPayload,
            handlers::guard::GateCheckResponse,
            handlers::guard::GuardStatusResponse,
        )
    ),
    tags(
        (name = "Guard", description = "Turno do funcionário e caixa do dia antes de ações sensíveis")
    ),
    modifiers(&GuardAccessDocs)
)]
pub struct ApiDoc;

// O JWT só identifica o usuário; papel e fuso vêm do vínculo com o restaurante do cabeçalho
struct GuardAccessDocs;

impl utoipa::Modify for GuardAccessDocs {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = "POS Guard API".to_string();

        let bearer = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some(
                "Token do provedor de autenticação. Toda rota do guard exige também o \
                 cabeçalho x-restaurant-id de um restaurante ao qual o usuário pertence.",
            ))
            .build();

        openapi
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme(BEARER_SCHEME, SecurityScheme::Http(bearer));
    }
}
