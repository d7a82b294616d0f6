// src/services/change_listener.rs

use std::sync::Arc;

use backon::{BackoffBuilder, ExponentialBuilder};
use tokio::task::JoinHandle;

use crate::{
    common::retry::RECONNECT_FALLBACK_DELAY,
    services::{
        change_hub::{ChangeHub, Subscription},
        session_guard::SessionGuard,
    },
};

/// Tarefa que mantém um guard em dia com o feed de mudanças.
///
/// A assinatura é feita de forma síncrona em `spawn`, antes da primeira
/// leitura, para não perder eventos entre o mount e o início da escuta.
/// Soltar o handle aborta a tarefa.
pub struct ChangeListener {
    task: JoinHandle<()>,
}

impl ChangeListener {
    pub fn spawn(guard: Arc<SessionGuard>, hub: ChangeHub, backoff: ExponentialBuilder) -> Self {
        let subscription = hub.subscribe(guard.change_scope());
        let task = tokio::spawn(listen(guard, hub, subscription, backoff));
        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(self) {
        // O Drop faz o trabalho
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn listen(
    guard: Arc<SessionGuard>,
    hub: ChangeHub,
    mut subscription: Subscription,
    backoff: ExponentialBuilder,
) {
    let mut delays = backoff.build();

    loop {
        match subscription.next().await {
            Some(Ok(event)) => {
                if !guard.is_alive() {
                    return;
                }
                // Evento entregue: a próxima queda começa do atraso mínimo
                delays = backoff.build();
                guard.apply_change(&event).await;
            }
            Some(Err(e)) => {
                tracing::warn!(
                    restaurant_id = %guard.restaurant_id(),
                    error = %e,
                    "Assinatura perdida, reassinando"
                );

                // Drop-and-resubscribe: solta a antiga, espera, assina de novo
                // e relê tudo sob demanda para cobrir o que se perdeu.
                drop(subscription);
                let delay = delays.next().unwrap_or(RECONNECT_FALLBACK_DELAY);
                tokio::time::sleep(delay).await;

                if !guard.is_alive() {
                    return;
                }
                subscription = hub.subscribe(guard.change_scope());
                guard.refresh().await;
            }
            None => {
                tracing::debug!(restaurant_id = %guard.restaurant_id(), "Hub encerrado, listener finalizado");
                return;
            }
        }

        if !guard.is_alive() {
            return;
        }
    }
}
