// src/db/change_feed.rs

// ---
// Ponte Postgres LISTEN/NOTIFY -> ChangeHub
// ---
// Os triggers de 'attendance_records' e 'cash_register_sessions' publicam no canal
// `guard_changes`. Esta tarefa repassa cada notificação ao hub. Quando a conexão
// cai, solta o listener, reconecta com LISTEN e só então publica um `Resync`.

use async_trait::async_trait;
use backon::{BackoffBuilder, ExponentialBuilder};
use sqlx::{postgres::PgListener, PgPool};

use crate::{
    common::retry::RECONNECT_FALLBACK_DELAY,
    models::change::{ChangeEvent, RowChange},
    services::change_hub::ChangeHub,
};

pub const CHANGE_CHANNEL: &str = "guard_changes";

pub fn parse_notification(payload: &str) -> Result<ChangeEvent, serde_json::Error> {
    let row: RowChange = serde_json::from_str(payload)?;
    Ok(ChangeEvent::Row(row))
}

/// Abre conexões já inscritas no canal de mudanças.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    type Connection: FeedConnection;

    /// Só retorna depois que o LISTEN estiver ativo.
    async fn connect(&self) -> Result<Self::Connection, sqlx::Error>;
}

#[async_trait]
pub trait FeedConnection: Send {
    /// Próximo payload. `Ok(None)` quando a conexão caiu.
    async fn next_payload(&mut self) -> Result<Option<String>, sqlx::Error>;
}

pub struct PgFeed {
    pool: PgPool,
}

impl PgFeed {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedConnector for PgFeed {
    type Connection = PgListener;

    async fn connect(&self) -> Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        Ok(listener)
    }
}

#[async_trait]
impl FeedConnection for PgListener {
    async fn next_payload(&mut self) -> Result<Option<String>, sqlx::Error> {
        // try_recv devolve None ao perder a conexão, sem reconectar ainda
        let notification = self.try_recv().await?;
        Ok(notification.map(|n| n.payload().to_string()))
    }
}

/// Roda até ser abortada.
pub async fn run_change_bridge(pool: PgPool, hub: ChangeHub, backoff: ExponentialBuilder) {
    run_feed(PgFeed::new(pool), hub, backoff).await;
}

pub async fn run_feed<C: FeedConnector>(connector: C, hub: ChangeHub, backoff: ExponentialBuilder) {
    let mut delays = backoff.build();
    let mut connected_before = false;

    loop {
        let mut connection = match connector.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                let delay = delays.next().unwrap_or(RECONNECT_FALLBACK_DELAY);
                tracing::error!(error = %e, delay_ms = delay.as_millis() as u64, "🔥 Falha ao escutar o canal de mudanças");
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        delays = backoff.build();
        // LISTEN ativo: o que mudar a partir daqui chega pelo canal
        if connected_before {
            let delivered = hub.publish(ChangeEvent::Resync);
            tracing::info!(delivered, "Canal de mudanças restabelecido, releitura forçada");
        }
        connected_before = true;
        tracing::info!("✅ Escutando o canal '{}'", CHANGE_CHANNEL);

        loop {
            match connection.next_payload().await {
                Ok(Some(payload)) => match parse_notification(&payload) {
                    Ok(event) => {
                        let delivered = hub.publish(event);
                        tracing::debug!(delivered, "Mudança repassada");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, %payload, "Notificação ignorada");
                    }
                },
                Ok(None) => {
                    tracing::warn!("Conexão do canal de mudanças perdida, reconectando");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Erro no canal de mudanças, reconectando");
                    break;
                }
            }
        }

        drop(connection);
        let delay = delays.next().unwrap_or(RECONNECT_FALLBACK_DELAY);
        tokio::time::sleep(delay).await;
    }
}
