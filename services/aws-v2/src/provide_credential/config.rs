use crate::constants::AWS_ACCESS_KEY_ID;
use crate::{Config, Credential};
use async_trait::async_trait;
use s3sign_core::{Context, ProvideCredential, Result};
use std::sync::Arc;

/// ConfigCredentialProvider builds a credential out of a [`Config`].
///
/// Fields missing from the config are filled from the environment. A session
/// token from the environment is only used together with the environment's
/// access key.
#[derive(Debug)]
pub struct ConfigCredentialProvider {
    config: Arc<Config>,
}

impl ConfigCredentialProvider {
    /// Create a new ConfigCredentialProvider.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for ConfigCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let mut config = self.config.as_ref().clone().from_env(ctx);
        if self.config.session_token.is_none()
            && self.config.access_key_id.is_some()
            && self.config.access_key_id != ctx.env_var(AWS_ACCESS_KEY_ID)
        {
            config.session_token = None;
        }

        if let (Some(ak), Some(sk)) = (config.access_key_id, config.secret_access_key) {
            return Ok(Some(Credential {
                access_key_id: ak,
                secret_access_key: sk,
                session_token: config.session_token,
            }));
        }

        Ok(None)
    }
}
