use std::sync::Arc;

use anyhow::Result;

pub mod handlers;
pub mod router;
pub mod types;

pub use handlers::*;
pub use router::create_router;
pub use types::*;

use crate::auth::TenantExtractor;
use crate::config::ApiConfig;
use crate::quota::QuotaClient;
use crate::storage::{ContactStore, CredentialStore, UploadStore};
use crate::uploads::FileStore;

pub struct ApiState {
    pub contacts: Arc<ContactStore>,
    pub credentials: Arc<CredentialStore>,
    pub upload_index: Arc<UploadStore>,
    pub files: Arc<FileStore>,
    pub auth: Arc<TenantExtractor>,
    pub quota: Option<Arc<QuotaClient>>,
    pub config: Arc<ApiConfig>,
}

impl ApiState {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let data_dir = config.data_dir.clone();
        let contacts = Arc::new(ContactStore::new(&data_dir)?);
        let credentials = Arc::new(CredentialStore::new(&data_dir)?);
        let upload_index = Arc::new(UploadStore::new(&data_dir)?);
        let files = Arc::new(FileStore::new(config.uploads_dir.clone())?);
        let auth = Arc::new(TenantExtractor::new(config.jwt_secret.as_deref()));
        let quota = match &config.usage_tracker_url {
            Some(url) => Some(Arc::new(QuotaClient::new(url.clone())?)),
            None => None,
        };

        Ok(Self {
            contacts,
            credentials,
            upload_index,
            files,
            auth,
            quota,
            config: Arc::new(config),
        })
    }
}
