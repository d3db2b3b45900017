//! Warehouse connection settings.

use serde::{Deserialize, Serialize};

use crate::name::Namespace;

/// Connection settings handed over by the caller.
///
/// Only [`WarehouseSettings::namespace`] is used by the SQL builders; the
/// remaining fields are for the session layer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseSettings {
    /// Account identifier.
    pub account: String,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Virtual warehouse.
    pub warehouse: String,
    /// Default database.
    pub database: String,
    /// Default schema.
    #[serde(alias = "schema_")]
    pub schema: String,
    /// Optional role.
    #[serde(default)]
    pub role: Option<String>,
}

impl WarehouseSettings {
    /// Default database and schema for name resolution.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.database.trim(), self.schema.trim())
    }
}

impl std::fmt::Debug for WarehouseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseSettings")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"***")
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .finish()
    }
}
