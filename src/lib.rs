//! Subscription emails for SecureLex.ru, sent through whichever provider
//! (SendPulse, Unisender or Dashamail) an administrator has selected.
//!
//! The HTTP surface lives in `routes`; everything provider-related is in
//! `email`, usable without the server.

pub mod authentication;
pub mod configuration;
pub mod domain;
pub mod email;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
