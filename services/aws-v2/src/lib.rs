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

//! AWS Signature Version 2 signing for S3-compatible object stores.
//!
//! This crate implements the legacy `AWS <AccessKeyId>:<Signature>` scheme
//! still spoken by most S3-compatible services, in both of its forms:
//!
//! - header signing: sets `Date` and `Authorization` on the request.
//! - query signing (presigned urls): appends `AWSAccessKeyId`, `Expires` and
//!   `Signature` to the query string.
//!
//! ## Quick Start
//!
//! ```no_run
//! use s3sign_aws_v2::{DefaultCredentialProvider, RequestSigner};
//! use s3sign_core::{Context, OsEnv, Signer};
//! use s3sign_file_read_tokio::TokioFileRead;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFileRead)
//!         .with_env(OsEnv);
//!
//!     let signer = Signer::new(ctx, DefaultCredentialProvider::new(), RequestSigner::new());
//!
//!     let mut parts = http::Request::get("https://s3.amazonaws.com/bucket/key")
//!         .body(())?
//!         .into_parts()
//!         .0;
//!     signer.sign(&mut parts, None).await?;
//!
//!     println!("{:?}", parts.headers.get(http::header::AUTHORIZATION));
//!     Ok(())
//! }
//! ```
//!
//! ## Credential Sources
//!
//! [`DefaultCredentialProvider`] tries, in order:
//!
//! 1. `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`
//! 2. `~/.aws/credentials` and `~/.aws/config`, for the profile named by
//!    `AWS_PROFILE` (or `default`)

#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod canonical;
pub use canonical::{canonicalize_amz_headers, canonicalize_resource, string_to_sign};

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
