// src/services/guard_registry.rs

// ---
// Registro de guards montados (estado de processo com ciclo de vida explícito)
// ---
// mount: cria o guard na primeira consulta do ator e já resolve os dois status.
// unmount: logout do ator. reset: desligamento do processo.
// evict_idle: solta guards de sessões abandonadas (aba fechada sem logout).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use backon::ExponentialBuilder;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    models::restaurant::RestaurantAccess,
    services::{
        change_hub::ChangeHub, change_listener::ChangeListener, session_guard::SessionGuard,
        sources::GuardEventSink, status_resolver::StatusResolver,
    },
};

type GuardKey = (Uuid, Uuid); // (restaurant_id, actor_id)

struct MountedGuard {
    guard: Arc<SessionGuard>,
    // Mantido vivo enquanto o guard estiver montado; o Drop aborta a tarefa
    _listener: ChangeListener,
    last_access: Instant,
}

impl MountedGuard {
    fn release(self) {
        self.guard.teardown();
    }
}

struct RegistryInner {
    guards: Mutex<HashMap<GuardKey, MountedGuard>>,
    resolver: StatusResolver,
    events: Arc<dyn GuardEventSink>,
    hub: ChangeHub,
    reconnect_backoff: ExponentialBuilder,
    staleness: Duration,
}

#[derive(Clone)]
pub struct GuardRegistry {
    inner: Arc<RegistryInner>,
}

impl GuardRegistry {
    pub fn new(
        resolver: StatusResolver,
        events: Arc<dyn GuardEventSink>,
        hub: ChangeHub,
        reconnect_backoff: ExponentialBuilder,
        staleness: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                guards: Mutex::new(HashMap::new()),
                resolver,
                events,
                hub,
                reconnect_backoff,
                staleness,
            }),
        }
    }

    pub async fn mount(&self, access: RestaurantAccess) -> Arc<SessionGuard> {
        let key = (access.restaurant_id, access.actor.id);

        let replaced = {
            let mut guards = self.lock();
            if let Some(mounted) = guards.get_mut(&key) {
                if mounted.guard.access() == access {
                    mounted.last_access = Instant::now();
                    return mounted.guard.clone();
                }
            }
            // Papel ou fuso mudou desde o último mount: o guard antigo não serve mais
            guards.remove(&key)
        };
        if let Some(old) = replaced {
            old.release();
        }

        let guard = Arc::new(SessionGuard::new(
            access,
            self.inner.resolver.clone(),
            self.inner.events.clone(),
            self.inner.staleness,
        ));
        let listener = ChangeListener::spawn(
            guard.clone(),
            self.inner.hub.clone(),
            self.inner.reconnect_backoff,
        );

        {
            let mut guards = self.lock();
            if let Some(existing) = guards.get_mut(&key) {
                if existing.guard.access() == access {
                    // Outra requisição montou primeiro; descarta o nosso
                    guard.teardown();
                    existing.last_access = Instant::now();
                    return existing.guard.clone();
                }
            }
            let previous = guards.insert(
                key,
                MountedGuard {
                    guard: guard.clone(),
                    _listener: listener,
                    last_access: Instant::now(),
                },
            );
            if let Some(previous) = previous {
                previous.release();
            }
        }

        tracing::info!(
            actor_id = %access.actor.id,
            restaurant_id = %access.restaurant_id,
            role = ?access.actor.role,
            utc_offset = %access.utc_offset,
            "Guard montado"
        );

        // Resolve-on-mount
        guard.refresh().await;
        guard
    }

    pub fn get(&self, restaurant_id: Uuid, actor_id: Uuid) -> Option<Arc<SessionGuard>> {
        self.lock().get_mut(&(restaurant_id, actor_id)).map(|mounted| {
            mounted.last_access = Instant::now();
            mounted.guard.clone()
        })
    }

    pub fn unmount(&self, restaurant_id: Uuid, actor_id: Uuid) -> bool {
        let removed = self.lock().remove(&(restaurant_id, actor_id));
        match removed {
            Some(mounted) => {
                mounted.release();
                tracing::info!(%actor_id, %restaurant_id, "Guard desmontado (logout)");
                true
            }
            None => false,
        }
    }

    /// Desmonta os guards sem acesso há mais de `max_idle`. Devolve quantos saíram.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let evicted: Vec<MountedGuard> = {
            let mut guards = self.lock();
            let idle: Vec<GuardKey> = guards
                .iter()
                .filter(|(_, mounted)| now.saturating_duration_since(mounted.last_access) > max_idle)
                .map(|(key, _)| *key)
                .collect();
            idle.iter().filter_map(|key| guards.remove(key)).collect()
        };

        let count = evicted.len();
        for mounted in evicted {
            tracing::debug!(
                actor_id = %mounted.guard.actor().id,
                restaurant_id = %mounted.guard.restaurant_id(),
                "Guard ocioso desmontado"
            );
            mounted.release();
        }
        if count > 0 {
            tracing::info!(count, "Guards ociosos desmontados");
        }
        count
    }

    /// Tarefa periódica de `evict_idle`. Termina sozinha quando o registro é solto.
    pub fn spawn_sweeper(&self, max_idle: Duration) -> JoinHandle<()> {
        let registry: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let period = (max_idle / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = registry.upgrade() else {
                    return;
                };
                GuardRegistry { inner }.evict_idle(max_idle);
            }
        })
    }

    /// Desmonta tudo. Chamado no desligamento do processo.
    pub fn reset(&self) {
        let drained: Vec<MountedGuard> = self.lock().drain().map(|(_, mounted)| mounted).collect();
        let count = drained.len();
        for mounted in drained {
            mounted.release();
        }
        tracing::info!(count, "Registro de guards zerado");
    }

    pub fn mounted_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<GuardKey, MountedGuard>> {
        // Nenhum código segura o lock durante um await nem entra em pânico com ele
        self.inner
            .guards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
