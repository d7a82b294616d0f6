// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::guard::ActorRole;

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor de autenticação.
// O papel não vem no token: depende do restaurante e é lido de 'restaurant_members'.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

// Usuário com token válido, ainda sem contexto de restaurante
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

// Quem está operando o ponto de venda, com o papel no restaurante atual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}
