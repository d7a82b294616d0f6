pub mod access;
pub mod auth;
pub mod change_hub;
pub mod change_listener;
pub mod debounce;
pub mod guard_gate;
pub mod guard_registry;
pub mod session_guard;
pub mod session_store;
pub mod sources;
pub mod status_resolver;

#[cfg(test)]
pub mod test_support;
