// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custody Auth Server - Widget Login, Bearer Tokens and Custodial Wallets
//!
//! This crate verifies chat-platform login-widget payloads, issues
//! short-lived HS256 bearer tokens over the verified fields, and provisions
//! one password-protected secp256k1 wallet per caller-supplied id.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `audit` - Security audit events
//! - `auth` - Widget HMAC verification and bearer tokens
//! - `crypto` - Password-derived AES-256-GCM envelopes
//! - `custody` - Fetch-or-create wallet provisioning
//! - `storage` - Record and secret stores (memory, redb, LRU cache)

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod custody;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
