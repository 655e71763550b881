use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    Jwt,
    Header,
}

/// Identity of the calling tenant, resolved from request headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: String,
    pub user_id: Option<String>,
    pub roles: Vec<String>,
    pub auth_method: AuthMethod,
}

impl TenantContext {
    pub fn new(tenant_id: String, auth_method: AuthMethod) -> Self {
        Self {
            tenant_id,
            user_id: None,
            roles: Vec::new(),
            auth_method,
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }
}
