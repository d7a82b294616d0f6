// src/services/guard_gate.rs

// ---
// Decisão do guard (pura, sem I/O)
// ---
// Ordem de precedência: caixa não aberto -> caixa fechado -> sem turno -> comanda não enviada.
// Qualquer incerteza sobre o status nega (fail-closed).

use crate::{
    models::{
        attendance::ShiftStatus,
        cash_register::CashRegisterStatus,
        guard::{ActionAttempt, ActorRole, DenialReason, GateDecision, ModalPrompt, SensitiveAction},
    },
    services::session_store::{SessionSnapshot, StatusView},
};

pub fn decide(role: ActorRole, snapshot: &SessionSnapshot, attempt: &ActionAttempt) -> GateDecision {
    if let Some(reason) = cash_register_denial(&snapshot.cash_register) {
        return GateDecision::Deny(reason);
    }
    if let Some(reason) = shift_denial(role, &snapshot.shift) {
        return GateDecision::Deny(reason);
    }
    match attempt.action {
        SensitiveAction::Payment if !attempt.kitchen_order_sent => {
            GateDecision::Deny(DenialReason::KitchenOrderNotSent)
        }
        SensitiveAction::Payment | SensitiveAction::KitchenOrder => GateDecision::Allow,
    }
}

pub fn cash_register_denial(view: &StatusView<CashRegisterStatus>) -> Option<DenialReason> {
    match view.confirmed() {
        None => Some(DenialReason::StatusUnavailable),
        Some(status) if status.is_closed => Some(DenialReason::RegisterClosed),
        Some(status) if !status.is_open => Some(DenialReason::RegisterNotOpened),
        Some(_) => None,
    }
}

pub fn shift_denial(role: ActorRole, view: &StatusView<ShiftStatus>) -> Option<DenialReason> {
    match role {
        ActorRole::Owner | ActorRole::Admin => None,
        ActorRole::Employee => match view.confirmed() {
            None => Some(DenialReason::StatusUnavailable),
            Some(status) if status.has_active_shift => None,
            Some(_) => Some(DenialReason::NoActiveShift),
        },
    }
}

/// Texto do modal de bloqueio, com uma única ação corretiva.
pub fn modal_for(reason: DenialReason, lang: &str) -> ModalPrompt {
    let (title, message, action_label) = match (reason, lang) {
        (DenialReason::RegisterNotOpened, "es") => (
            "Caja no abierta",
            "Abra la caja del día antes de registrar ventas.",
            "Abrir caja",
        ),
        (DenialReason::RegisterNotOpened, "pt") => (
            "Caixa não aberto",
            "Abra o caixa do dia antes de registrar vendas.",
            "Abrir caixa",
        ),
        (DenialReason::RegisterNotOpened, _) => (
            "Register not opened",
            "Open today's cash register before processing sales.",
            "Open register",
        ),
        (DenialReason::RegisterClosed, "es") => (
            "Caja cerrada",
            "La caja de hoy ya fue cerrada. No es posible registrar más ventas.",
            "Ver caja",
        ),
        (DenialReason::RegisterClosed, "pt") => (
            "Caixa fechado",
            "O caixa de hoje já foi fechado. Não é possível registrar mais vendas.",
            "Ver caixa",
        ),
        (DenialReason::RegisterClosed, _) => (
            "Register closed",
            "Today's cash register is already closed. No more sales can be processed.",
            "View register",
        ),
        (DenialReason::NoActiveShift, "es") => (
            "Sin turno activo",
            "Marque su entrada antes de continuar.",
            "Marcar entrada",
        ),
        (DenialReason::NoActiveShift, "pt") => (
            "Sem turno ativo",
            "Registre sua entrada antes de continuar.",
            "Registrar entrada",
        ),
        (DenialReason::NoActiveShift, _) => (
            "No active shift",
            "Clock in before continuing.",
            "Clock in",
        ),
        (DenialReason::KitchenOrderNotSent, "es") => (
            "Comanda no enviada",
            "Envíe la comanda a cocina antes de cobrar.",
            "Enviar comanda",
        ),
        (DenialReason::KitchenOrderNotSent, "pt") => (
            "Comanda não enviada",
            "Envie a comanda para a cozinha antes de cobrar.",
            "Enviar comanda",
        ),
        (DenialReason::KitchenOrderNotSent, _) => (
            "Kitchen order not sent",
            "Send the order to the kitchen before charging.",
            "Send order",
        ),
        (DenialReason::StatusUnavailable, "es") => (
            "No fue posible verificar",
            "No pudimos confirmar el estado de la caja o del turno. Intente de nuevo.",
            "Reintentar",
        ),
        (DenialReason::StatusUnavailable, "pt") => (
            "Não foi possível verificar",
            "Não conseguimos confirmar o status do caixa ou do turno. Tente novamente.",
            "Tentar novamente",
        ),
        (DenialReason::StatusUnavailable, _) => (
            "Could not verify",
            "We could not confirm the register or shift status. Please try again.",
            "Retry",
        ),
    };

    ModalPrompt {
        title: title.to_string(),
        message: message.to_string(),
        action_label: action_label.to_string(),
        action_route: action_route(reason).to_string(),
    }
}

fn action_route(reason: DenialReason) -> &'static str {
    match reason {
        DenialReason::RegisterNotOpened => "/cash-register/open",
        DenialReason::RegisterClosed => "/cash-register",
        DenialReason::NoActiveShift => "/attendance/clock-in",
        DenialReason::KitchenOrderNotSent => "/orders/kitchen",
        DenialReason::StatusUnavailable => "/pos",
    }
}
