use soroban_sdk::{Address, Env};

use crate::storage;

/// Proof that the pool admin authorized the current invocation.
///
/// Configuration functions take an `&AdminAuth` so they cannot be reached without one.
pub struct AdminAuth {
    admin: Address,
}

impl AdminAuth {
    /// Load the admin and require its authorization
    ///
    /// ### Panics
    /// If the pool is not initialized or the admin did not authorize the invocation
    pub fn require(e: &Env) -> Self {
        let admin = storage::get_admin(e);
        admin.require_auth();
        AdminAuth { admin }
    }

    pub fn address(&self) -> &Address {
        &self.admin
    }
}

/// Proof that the emergency admin authorized the current invocation.
pub struct EmergencyAuth {
    admin: Address,
}

impl EmergencyAuth {
    /// Load the emergency admin and require its authorization
    ///
    /// ### Panics
    /// If the pool is not initialized or the emergency admin did not authorize the invocation
    pub fn require(e: &Env) -> Self {
        let admin = storage::get_emergency_admin(e);
        admin.require_auth();
        EmergencyAuth { admin }
    }

    pub fn address(&self) -> &Address {
        &self.admin
    }
}
