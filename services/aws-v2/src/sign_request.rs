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

use std::time::Duration;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, DATE};
use http::request::Parts;
use http::HeaderValue;
use log::debug;
use s3sign_core::hash::base64_hmac_sha1;
use s3sign_core::time::{format_http_date, format_timestamp, now, DateTime};
use s3sign_core::{Context, Error, Result, SignRequest, SigningMethod, SigningRequest};

use crate::canonical::string_to_sign;
use crate::constants::*;
use crate::Credential;

/// RequestSigner that implements AWS Signature Version 2.
///
/// - [Signing and Authenticating REST Requests](https://docs.aws.amazon.com/AmazonS3/latest/userguide/RESTAuthentication.html)
#[derive(Debug, Default, Clone)]
pub struct RequestSigner {
    bucket: Option<String>,
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a signer for path-style requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign virtual-hosted requests for `bucket`.
    ///
    /// The bucket lives in the host of such requests, so it's prepended to the
    /// canonicalized resource.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Sign the request with an `Authorization` header.
    ///
    /// The caller's `Date` header is signed as is; when absent, it's set to the
    /// current time. A request carrying `x-amz-date` signs an empty date line
    /// and gets no `Date` header.
    pub fn sign_header(&self, parts: &mut Parts, cred: &Credential) -> Result<()> {
        let mut req = SigningRequest::build(parts)?;
        debug!("signing request to {} with header", req.authority);

        if let Some(token) = &cred.session_token {
            req.headers.insert(X_AMZ_SECURITY_TOKEN, token.parse()?);
        }

        let date = if req.headers.contains_key(X_AMZ_DATE) {
            String::new()
        } else if let Some(v) = req.headers.get(DATE) {
            String::from_utf8_lossy(v.as_bytes()).into_owned()
        } else {
            let date = format_http_date(self.time.unwrap_or_else(now));
            req.headers.insert(DATE, date.parse()?);
            date
        };

        let string_to_sign = string_to_sign(&req, &date, self.bucket.as_deref());
        debug!("string to sign: {string_to_sign:?}");
        let signature = base64_hmac_sha1(
            cred.secret_access_key.as_bytes(),
            string_to_sign.as_bytes(),
        );

        req.headers.insert(AUTHORIZATION, {
            let mut value: HeaderValue =
                format!("AWS {}:{}", cred.access_key_id, signature).parse()?;
            value.set_sensitive(true);

            value
        });

        req.apply(parts)
    }

    /// Sign the request with query parameters and return the presigned url.
    ///
    /// The url stays valid for `expires_in` from the signing time. Existing
    /// query parameters are preserved.
    pub fn presign_url(
        &self,
        parts: &mut Parts,
        cred: &Credential,
        expires_in: Duration,
    ) -> Result<String> {
        let mut req = SigningRequest::build(parts)?;
        debug!("signing request to {} with query", req.authority);

        let expires = chrono::TimeDelta::from_std(expires_in)
            .ok()
            .and_then(|d| self.time.unwrap_or_else(now).checked_add_signed(d))
            .map(format_timestamp)
            .ok_or_else(|| {
                Error::request_invalid(format!("expires_in {expires_in:?} is out of range"))
            })?;

        // The session token travels in query, but is signed as an amz header.
        if let Some(token) = &cred.session_token {
            req.headers.insert(X_AMZ_SECURITY_TOKEN, token.parse()?);
        }
        let string_to_sign = string_to_sign(&req, &expires, self.bucket.as_deref());
        debug!("string to sign: {string_to_sign:?}");
        let signature = base64_hmac_sha1(
            cred.secret_access_key.as_bytes(),
            string_to_sign.as_bytes(),
        );

        req.query_push(AWS_ACCESS_KEY_ID_QUERY, &cred.access_key_id);
        req.query_push(EXPIRES_QUERY, expires);
        req.query_push(SIGNATURE_QUERY, signature);
        if let Some(token) = &cred.session_token {
            req.headers.remove(X_AMZ_SECURITY_TOKEN);
            req.query_push(X_AMZ_SECURITY_TOKEN, token);
        }

        req.apply(parts)?;
        Ok(parts.uri.to_string())
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        parts: &mut Parts,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            debug!("no credential available, request is sent anonymously");
            return Ok(());
        };

        let method = match expires_in {
            Some(d) => SigningMethod::Query(d),
            None => SigningMethod::Header,
        };
        match method {
            SigningMethod::Header => self.sign_header(parts, cred),
            SigningMethod::Query(d) => self.presign_url(parts, cred, d).map(|_| ()),
        }
    }
}
