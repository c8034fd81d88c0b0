//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random tokens, HMAC-signed values)
//! - Cookie management

pub mod cookie;
pub mod crypto;
