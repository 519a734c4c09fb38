//! School Records - auditable entities, optimistic-concurrency storage and
//! auth response shapes shared by the school platform.

pub mod config;
pub mod db;
pub mod dtos;
pub mod models;
pub mod services;
pub mod startup;
