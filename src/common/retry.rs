//! Backoff exponencial das leituras do guard e da reconexão do feed.
//!
//! A política é um `backon::ExponentialBuilder` montado a partir da configuração.
//! As leituras usam `Retryable::retry`; os laços de reconexão consomem o iterador.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Atraso se o iterador de reconexão se esgotar.
pub const RECONNECT_FALLBACK_DELAY: Duration = Duration::from_secs(30);

/// `max_attempts` conta a primeira tentativa; o builder conta só as retentativas.
pub fn exponential(base_delay: Duration, max_delay: Duration, max_attempts: usize) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(base_delay)
        .with_max_delay(max_delay)
        .with_max_times(max_attempts.saturating_sub(1))
}

/// Para laços de reconexão: não se esgota, e o jitter espalha os guards que caíram juntos.
pub fn reconnecting(base_delay: Duration, max_delay: Duration) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(base_delay)
        .with_max_delay(max_delay)
        .with_max_times(usize::MAX)
        .with_jitter()
}

/// Sem espera entre tentativas. Para testes.
#[cfg(test)]
pub fn immediate(max_attempts: usize) -> ExponentialBuilder {
    exponential(Duration::ZERO, Duration::ZERO, max_attempts)
}
