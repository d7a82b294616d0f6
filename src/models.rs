pub mod attendance;
pub mod audit;
pub mod auth;
pub mod cash_register;
pub mod change;
pub mod guard;
pub mod restaurant;
