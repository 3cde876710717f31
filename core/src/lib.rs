//! Core library for stride: a per-date fitness ledger and a weight trend
//! predictor built on top of it.

pub mod catalog;
pub mod db;
pub mod interchange;
pub mod ledger;
pub mod models;
pub mod predictor;
pub mod session;
