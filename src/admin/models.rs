// src/admin/models.rs

use serde::{Deserialize, Serialize};

use crate::profile::models::Profile;

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeResponse {
    pub profile: Profile,
    /// Listings removed by a demotion to buyer
    pub deleted_products: u64,
}
