use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials: no bearer token or tenant header")]
    MissingCredentials,
    #[error("invalid bearer token: {0}")]
    InvalidJwt(#[from] jsonwebtoken::errors::Error),
    #[error("token does not carry a tenant id")]
    TenantIdNotFound,
}
