//! Core types for apiguard.
//!
//! This crate provides the data model shared by every other crate:
//!
//! - **Routing rules**: [`ApiConfig`], one allow/deny rule for a method and
//!   path of a backend service, decoded from the control-plane wire format
//! - **Gateway groups**: [`GroupId`], the single-character partition id
//! - **Applications**: [`App`], the registry entry describing how a calling
//!   application authenticates
//!
//! # Example
//!
//! ```
//! use apiguard_core::{ApiConfig, GroupId, RuleAccess};
//!
//! let raw = r#"{"id":7,"app":"partnerX","gatewayGroup":"a","service":"orders",
//!              "method":"GET","path":"/orders","access":1,"isDeleted":0}"#;
//! let rule = ApiConfig::decode(raw).unwrap();
//!
//! assert_eq!(rule.id, 7);
//! assert_eq!(rule.gateway_group, GroupId::new('a'));
//! assert_eq!(rule.access, RuleAccess::Allow);
//! assert!(!rule.deleted);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod api;
pub mod app;
pub mod error;
pub mod ids;

pub use api::{ApiConfig, ApiId, RuleAccess};
pub use app::{App, AuthType};
pub use error::{CoreError, Result};
pub use ids::GroupId;
