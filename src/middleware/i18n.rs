// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const SUPPORTED: [&str; 3] = ["en", "es", "pt"];
const DEFAULT_LANG: &str = "en";

// Idioma dos textos de modal, a partir do Accept-Language
pub struct Locale(pub String);

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                // "pt-BR" -> "pt"; fica o primeiro idioma suportado, na ordem de preferência
                accept_language::parse(header_str)
                    .into_iter()
                    .filter_map(|tag| {
                        let primary = tag.split('-').next().unwrap_or(&tag).to_lowercase();
                        SUPPORTED.contains(&primary.as_str()).then_some(primary)
                    })
                    .next()
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Ok(Locale(lang))
    }
}
