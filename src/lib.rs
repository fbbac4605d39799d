//! CivicPulse - a civic complaint reporting and official accountability
//! platform.
//!
//! # Overview
//!
//! Citizens submit complaints about civic issues; each complaint is routed
//! to the official responsible for its ward. Officials work complaints
//! through a small status lifecycle, and complaints that sit unresolved past
//! a threshold are promoted to a public listing where citizens can review
//! the handling. Reviews feed each official's performance score and a public
//! leaderboard, so slow or unresponsive wards become visible.
//!
//! # Modules
//!
//! - [`model`]: Domain types, status machine, and wire types
//! - [`storage`]: SQLite storage layer
//! - [`error`]: Caller-visible failure taxonomy and its HTTP mapping
//! - [`auth`]: Password hashing, tokens, and the credential flows
//! - [`lifecycle`]: Complaint submission, status transitions, delayed sweep
//! - [`scoring`]: Performance score recomputation, leaderboard, dashboard
//! - [`review`]: Review admission gate
//! - [`api`]: HTTP API handlers and the router

pub mod api;
pub mod auth;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod review;
pub mod scoring;
pub mod storage;
