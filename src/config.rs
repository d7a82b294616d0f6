// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use backon::ExponentialBuilder;
use chrono::FixedOffset;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::{
        clock::{Clock, SystemClock},
        retry,
    },
    db::{AttendanceRepository, AuditRepository, CashRegisterRepository, RestaurantRepository},
    services::{
        access::AccessService,
        auth::AuthService,
        change_hub::ChangeHub,
        debounce::Debouncer,
        guard_registry::GuardRegistry,
        sources::{AttendanceSource, CashRegisterSource, GuardEventSink, MembershipSource},
        status_resolver::StatusResolver,
    },
};

// ---
// Configuração lida do ambiente (.env)
// ---
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    /// Fuso dos restaurantes que não cadastraram o seu.
    pub default_utc_offset: FixedOffset,
    pub staleness: Duration,
    pub debounce: Duration,
    /// Guards sem nenhum acesso por mais que isso são desmontados.
    pub idle_eviction: Duration,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    /// Conta a primeira tentativa.
    pub retry_max_attempts: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let offset_minutes: i32 = parse_or(&lookup, "DEFAULT_UTC_OFFSET_MINUTES", 0)?;
        let default_utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("DEFAULT_UTC_OFFSET_MINUTES fora do intervalo: {offset_minutes}"))?;

        let idle_eviction = Duration::from_secs(parse_or(&lookup, "GUARD_IDLE_SECS", 1800)?);
        if idle_eviction.is_zero() {
            return Err(anyhow!("GUARD_IDLE_SECS deve ser maior que zero"));
        }

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            default_utc_offset,
            staleness: Duration::from_secs(parse_or(&lookup, "GUARD_STALENESS_SECS", 60)?),
            debounce: Duration::from_millis(parse_or(&lookup, "GUARD_DEBOUNCE_MS", 1500)?),
            idle_eviction,
            retry_base_delay: Duration::from_millis(parse_or(&lookup, "GUARD_RETRY_BASE_MS", 100)?),
            retry_max_delay: Duration::from_millis(parse_or(&lookup, "GUARD_RETRY_MAX_MS", 2000)?),
            retry_max_attempts: parse_or(&lookup, "GUARD_RETRY_MAX_ATTEMPTS", 3)?,
        })
    }

    /// Backoff das leituras de ponto e caixa.
    pub fn read_backoff(&self) -> ExponentialBuilder {
        retry::exponential(self.retry_base_delay, self.retry_max_delay, self.retry_max_attempts)
    }

    /// Backoff da ponte LISTEN e dos listeners dos guards; nunca desiste.
    pub fn reconnect_backoff(&self) -> ExponentialBuilder {
        retry::reconnecting(self.retry_base_delay, self.retry_max_delay)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} inválida: '{raw}'")),
        None => Ok(default),
    }
}

/// Colaboradores externos do guard. Em produção, os repositórios Postgres.
pub struct GuardSources {
    pub attendance: Arc<dyn AttendanceSource>,
    pub cash_registers: Arc<dyn CashRegisterSource>,
    pub memberships: Arc<dyn MembershipSource>,
    pub events: Arc<dyn GuardEventSink>,
    pub clock: Arc<dyn Clock>,
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub access_service: AccessService,
    pub change_hub: ChangeHub,
    pub guard_registry: GuardRegistry,
    pub debouncer: Debouncer,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let sources = GuardSources {
            attendance: Arc::new(AttendanceRepository::new(db_pool.clone())),
            cash_registers: Arc::new(CashRegisterRepository::new(db_pool.clone())),
            memberships: Arc::new(RestaurantRepository::new(db_pool.clone())),
            events: Arc::new(AuditRepository::new(db_pool.clone())),
            clock: Arc::new(SystemClock),
        };

        Ok(Self::with_sources(config, db_pool, sources))
    }

    pub fn with_sources(config: Config, db_pool: PgPool, sources: GuardSources) -> Self {
        let resolver = StatusResolver::new(
            sources.attendance,
            sources.cash_registers,
            sources.clock,
            config.read_backoff(),
        );

        let change_hub = ChangeHub::default();
        let guard_registry = GuardRegistry::new(
            resolver,
            sources.events,
            change_hub.clone(),
            config.reconnect_backoff(),
            config.staleness,
        );

        Self {
            db_pool,
            auth_service: AuthService::new(config.jwt_secret.clone()),
            access_service: AccessService::new(sources.memberships, config.default_utc_offset),
            debouncer: Debouncer::new(config.debounce),
            change_hub,
            guard_registry,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "segredo"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.default_utc_offset.local_minus_utc(), 0);
        assert_eq!(config.staleness, Duration::from_secs(60));
        assert_eq!(config.debounce, Duration::from_millis(1500));
        assert_eq!(config.idle_eviction, Duration::from_secs(1800));
        assert_eq!(config.retry_base_delay, Duration::from_millis(100));
        assert_eq!(config.retry_max_delay, Duration::from_millis(2000));
        assert_eq!(config.retry_max_attempts, 3);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "segredo"),
            ("DEFAULT_UTC_OFFSET_MINUTES", "-300"),
            ("GUARD_STALENESS_SECS", "15"),
            ("GUARD_IDLE_SECS", "600"),
            ("GUARD_RETRY_MAX_ATTEMPTS", "5"),
        ])
        .unwrap();

        assert_eq!(config.default_utc_offset.local_minus_utc(), -300 * 60);
        assert_eq!(config.staleness, Duration::from_secs(15));
        assert_eq!(config.idle_eviction, Duration::from_secs(600));
        assert_eq!(config.retry_max_attempts, 5);
    }

    #[test]
    fn test_read_backoff_follows_retry_settings() {
        use backon::BackoffBuilder;

        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "segredo"),
            ("GUARD_RETRY_BASE_MS", "50"),
            ("GUARD_RETRY_MAX_MS", "80"),
            ("GUARD_RETRY_MAX_ATTEMPTS", "4"),
        ])
        .unwrap();

        let delays: Vec<Duration> = config.read_backoff().build().collect();
        assert_eq!(
            delays,
            vec![Duration::from_millis(50), Duration::from_millis(80), Duration::from_millis(80)]
        );
    }

    #[test]
    fn test_zero_idle_eviction_is_an_error() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "segredo"),
            ("GUARD_IDLE_SECS", "0"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let result = config_from(&[("DATABASE_URL", "postgres://localhost/pos")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "segredo"),
            ("GUARD_DEBOUNCE_MS", "rápido"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_offset_out_of_range_is_an_error() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "segredo"),
            ("DEFAULT_UTC_OFFSET_MINUTES", "2000"),
        ]);
        assert!(result.is_err());
    }
}
