//! Firma Server Library
//!
//! Self-hosted PDF e-signature service: composite a drawn signature onto a
//! page of an uploaded PDF at a UI-derived placement, and account each
//! export against a plan-based quota.
//!
//! # Modules
//!
//! - `signing`: placement transform and PDF compositing core
//! - `quota`: plan tiers and period accounting
//! - `routes`: HTTP surface (axum)
//! - `db`: SQLite persistence for users and usage rows

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod quota;
pub mod routes;
pub mod signing;
pub mod state;
