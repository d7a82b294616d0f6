// src/services/access.rs

use std::sync::Arc;

use anyhow::anyhow;
use chrono::FixedOffset;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{Actor, AuthenticatedUser},
        restaurant::RestaurantAccess,
    },
    services::sources::MembershipSource,
};

/// Resolve o acesso de um usuário autenticado a um restaurante.
///
/// O papel sai de 'restaurant_members' (nunca do token) e o fuso do cadastro
/// do restaurante, com o padrão do serviço quando não houver um.
#[derive(Clone)]
pub struct AccessService {
    memberships: Arc<dyn MembershipSource>,
    default_utc_offset: FixedOffset,
}

impl AccessService {
    pub fn new(memberships: Arc<dyn MembershipSource>, default_utc_offset: FixedOffset) -> Self {
        Self {
            memberships,
            default_utc_offset,
        }
    }

    pub async fn resolve(
        &self,
        user: AuthenticatedUser,
        restaurant_id: Uuid,
    ) -> Result<RestaurantAccess, AppError> {
        let Some(membership) = self.memberships.membership(user.id, restaurant_id).await? else {
            tracing::warn!(user_id = %user.id, %restaurant_id, "Acesso negado: usuário sem vínculo");
            return Err(AppError::NotAMember);
        };

        let utc_offset = match membership.utc_offset_minutes {
            None => self.default_utc_offset,
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| anyhow!("Fuso inválido no restaurante {restaurant_id}: {minutes} min"))?,
        };

        Ok(RestaurantAccess {
            actor: Actor {
                id: user.id,
                role: membership.role,
            },
            restaurant_id,
            utc_offset,
        })
    }
}
