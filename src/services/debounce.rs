// src/services/debounce.rs

// Intervalo mínimo entre chamadas aceitas da mesma chave (evita submissão em dobro).
// Uma chamada dentro da janela é descartada e, se houver, o callback de "debounced" roda no lugar.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::time::Instant;

#[derive(Debug, PartialEq, Eq)]
pub enum Debounced<T> {
    Executed(T),
    Dropped,
}

#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    last_accepted: Arc<Mutex<HashMap<String, Instant>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_accepted: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registra a chamada se estiver fora da janela. `false` = descartada.
    pub fn try_accept(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut last_accepted = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Limpa chaves cuja janela já passou
        last_accepted.retain(|_, at| now.saturating_duration_since(*at) < self.delay);

        if last_accepted.contains_key(key) {
            return false;
        }
        last_accepted.insert(key.to_string(), now);
        true
    }

    pub async fn call<T, F, Fut>(&self, key: &str, action: F) -> Debounced<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.try_accept(key) {
            tracing::debug!(%key, "Chamada descartada pelo debounce");
            return Debounced::Dropped;
        }
        Debounced::Executed(action().await)
    }

    pub async fn call_or_else<T, F, Fut, D>(&self, key: &str, action: F, on_debounced: D) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
        D: FnOnce() -> T,
    {
        match self.call(key, action).await {
            Debounced::Executed(value) => value,
            Debounced::Dropped => on_debounced(),
        }
    }
}
