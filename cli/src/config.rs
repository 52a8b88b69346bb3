// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use http::Uri;
use s3sign_aws_v2::{
    Config, ConfigCredentialProvider, Credential, ProfileCredentialProvider,
};
use s3sign_core::{Context, ProvideCredentialChain};

use crate::args::GlobalArgs;
use crate::client::{Endpoint, S3Client};

/// Resolved global configuration of a run.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    endpoint: Endpoint,
    anonymous: bool,
    credential: Arc<Config>,
}

impl ClientConfig {
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let uri: Uri = args
            .endpoint
            .parse()
            .with_context(|| format!("invalid endpoint {}", args.endpoint))?;
        let scheme = uri
            .scheme_str()
            .ok_or_else(|| anyhow!("endpoint {} has no scheme", args.endpoint))?;
        let authority = uri
            .authority()
            .ok_or_else(|| anyhow!("endpoint {} has no host", args.endpoint))?;
        if !matches!(uri.path(), "" | "/") || uri.query().is_some() {
            bail!("endpoint {} must not carry a path or query", args.endpoint);
        }

        let mut credential = Config::new();
        if let Some(v) = &args.access_key {
            credential = credential.with_access_key_id(v);
        }
        if let Some(v) = &args.secret_key {
            credential = credential.with_secret_access_key(v);
        }
        if let Some(v) = &args.profile {
            credential = credential.with_profile(v);
        }

        Ok(Self {
            endpoint: Endpoint {
                scheme: scheme.to_string(),
                authority: authority.to_string(),
                virtual_host: args.virtual_host,
            },
            anonymous: args.anonymous,
            credential: Arc::new(credential),
        })
    }

    /// Credential sources, in order: flags and environment, then the shared
    /// profile files. Anonymous runs resolve nothing.
    pub fn credential_provider(&self) -> ProvideCredentialChain<Credential> {
        if self.anonymous {
            return ProvideCredentialChain::new();
        }

        let mut profile = ProfileCredentialProvider::new();
        if let Some(name) = &self.credential.profile {
            profile = profile.with_profile(name);
        }

        ProvideCredentialChain::new()
            .push(ConfigCredentialProvider::new(self.credential.clone()))
            .push(profile)
    }

    /// Client for `bucket`, or for the service itself when `None`.
    pub fn client(&self, ctx: &Context, bucket: Option<&str>) -> S3Client {
        S3Client::new(
            ctx.clone(),
            self.endpoint.clone(),
            bucket,
            self.credential_provider(),
        )
    }
}
