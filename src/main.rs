//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Sem configuração válida a aplicação não deve iniciar
    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Ponte LISTEN/NOTIFY -> hub de mudanças
    let bridge = tokio::spawn(db::change_feed::run_change_bridge(
        app_state.db_pool.clone(),
        app_state.change_hub.clone(),
        app_state.config.reconnect_backoff(),
    ));

    // Solta guards de sessões abandonadas sem logout
    let sweeper = app_state
        .guard_registry
        .spawn_sweeper(app_state.config.idle_eviction);

    let app = routes::router(app_state.clone());

    let listener = TcpListener::bind(&app_state.config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Nada de estado de sessão sobrevive ao processo
    bridge.abort();
    sweeper.abort();
    app_state.guard_registry.reset();
    tracing::info!("Servidor encerrado");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("🔥 Falha ao instalar o handler de Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Sinal de desligamento recebido");
}
