pub mod auth;
pub mod balance;
pub mod budget_status;
pub mod config;
pub mod error;
pub mod form;
pub mod format;
pub mod gateway;
pub mod investments;
pub mod models;
pub mod session;
pub mod sync;
pub mod views;

#[cfg(test)]
mod testing;
