// src/services/auth.rs

// Os tokens são emitidos pelo provedor de autenticação; aqui só validamos.
// O token identifica o usuário. O papel depende do restaurante (ver `access`).

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    models::auth::{AuthenticatedUser, Claims},
};

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(AuthenticatedUser {
            id: token_data.claims.sub,
        })
    }

    #[cfg(test)]
    pub fn create_token(
        &self,
        user_id: uuid::Uuid,
        ttl: chrono::Duration,
    ) -> Result<String, AppError> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    #[test]
    fn test_valid_token_yields_user() {
        let service = AuthService::new("segredo-de-teste".into());
        let user_id = Uuid::new_v4();

        let token = service.create_token(user_id, chrono::Duration::hours(1)).unwrap();
        assert_eq!(service.validate_token(&token).unwrap(), AuthenticatedUser { id: user_id });
    }

    #[test]
    fn test_role_claim_in_token_is_ignored() {
        let secret = "segredo-de-teste";
        let user_id = Uuid::new_v4();
        let now = chrono::Utc::now().timestamp();
        // Token de outro emissor que ainda carrega um papel global
        let claims = serde_json::json!({
            "sub": user_id,
            "role": "OWNER",
            "exp": now + 3600,
            "iat": now,
        });
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap();

        let user = AuthService::new(secret.into()).validate_token(&token).unwrap();
        assert_eq!(user, AuthenticatedUser { id: user_id });
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = AuthService::new("um".into())
            .create_token(Uuid::new_v4(), chrono::Duration::hours(1))
            .unwrap();

        let result = AuthService::new("outro".into()).validate_token(&token);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = AuthService::new("segredo-de-teste".into());

        let token = service.create_token(Uuid::new_v4(), chrono::Duration::hours(-2)).unwrap();
        assert!(matches!(service.validate_token(&token), Err(AppError::InvalidToken)));
    }
}
