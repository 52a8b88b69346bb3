use crate::provide_credential::{EnvCredentialProvider, ProfileCredentialProvider};
use crate::Credential;
use async_trait::async_trait;
use s3sign_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

/// DefaultCredentialProvider is a loader that will try to load credential via default chains.
///
/// Resolution order:
///
/// 1. Environment variables
/// 2. Shared config (`~/.aws/config`, `~/.aws/credentials`)
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCredentialProvider {
    /// Create a new `DefaultCredentialProvider` instance.
    pub fn new() -> Self {
        let chain = ProvideCredentialChain::new()
            .push(EnvCredentialProvider::new())
            .push(ProfileCredentialProvider::new());

        Self { chain }
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use s3sign_core::StaticEnv;
    use s3sign_file_read_tokio::TokioFileRead;
    use std::collections::HashMap;
    use std::io::Write;

    #[tokio::test]
    async fn test_default_without_env() {
        let _ = env_logger::builder().is_test(true).try_init();

        let ctx = Context::new()
            .with_file_read(TokioFileRead)
            .with_env(StaticEnv {
                home_dir: None,
                envs: HashMap::from([
                    (
                        AWS_SHARED_CREDENTIALS_FILE.to_string(),
                        "/non/existent/credentials".to_string(),
                    ),
                    (
                        AWS_CONFIG_FILE.to_string(),
                        "/non/existent/config".to_string(),
                    ),
                ]),
            });

        let x = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .expect("load must succeed");
        assert!(x.is_none());
    }

    #[tokio::test]
    async fn test_default_prefers_env() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[default]")?;
        writeln!(file, "aws_access_key_id = PROFILEACCESSKEYID")?;
        writeln!(file, "aws_secret_access_key = PROFILESECRETACCESSKEY")?;

        let mut envs = HashMap::from([(
            AWS_SHARED_CREDENTIALS_FILE.to_string(),
            file.path().to_string_lossy().to_string(),
        )]);
        let ctx = Context::new()
            .with_file_read(TokioFileRead)
            .with_env(StaticEnv {
                home_dir: None,
                envs: envs.clone(),
            });
        let x = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("profile credential must be loaded");
        assert_eq!(x.access_key_id, "PROFILEACCESSKEYID");

        envs.insert(AWS_ACCESS_KEY_ID.to_string(), "ENVACCESSKEYID".to_string());
        envs.insert(
            AWS_SECRET_ACCESS_KEY.to_string(),
            "ENVSECRETACCESSKEY".to_string(),
        );
        let ctx = Context::new()
            .with_file_read(TokioFileRead)
            .with_env(StaticEnv {
                home_dir: None,
                envs,
            });
        let x = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("env credential must be loaded");
        assert_eq!(x.access_key_id, "ENVACCESSKEYID");
        assert_eq!(x.secret_access_key, "ENVSECRETACCESSKEY");

        Ok(())
    }
}
