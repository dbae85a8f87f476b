//! Support desk configuration.

use serde::Deserialize;

use crate::model::UserHandle;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    /// Platform handles of the administrators who receive ticket traffic.
    pub admins: Vec<UserHandle>,
}

impl SupportConfig {
    pub fn is_admin(&self, handle: &UserHandle) -> bool {
        self.admins.iter().any(|admin| admin == handle)
    }
}
