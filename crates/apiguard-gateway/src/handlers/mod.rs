//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway API.

pub mod access;
pub mod admin;
pub mod health;
