//! Well-known store keys.
//!
//! Every gateway instance reads the same hash and listens on the same channel,
//! so these names are part of the control-plane contract.

/// Hash holding every routing rule, one field per rule id.
pub const API_CONFIG_KEY: &str = "fizz_api_config";

/// Channel on which rule changes are published, one rule per message.
pub const API_CONFIG_CHANNEL: &str = "fizz_api_config_channel";
