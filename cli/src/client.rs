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

use anyhow::{anyhow, Context as _, Result};
use bytes::Bytes;
use http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use http::{HeaderMap, HeaderValue, Method, Request, Response};
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use quick_xml::de;
use s3sign_aws_v2::{Credential, RequestSigner};
use s3sign_core::hash::base64_md5;
use s3sign_core::time::{parse_http_date, DateTime};
use s3sign_core::{ProvideCredential, Signer};

use crate::error::ServiceError;
use crate::xml::*;

/// Object keys keep `/` and the unreserved characters, everything else is
/// percent encoded.
static KEY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

static CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// Where requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub authority: String,
    /// Put the bucket in the host instead of the path.
    pub virtual_host: bool,
}

/// Metadata returned by HEAD object.
#[derive(Debug, Default)]
pub struct ObjectMeta {
    pub content_length: u64,
    pub content_type: Option<String>,
    pub e_tag: Option<String>,
    pub last_modified: Option<DateTime>,
}

/// Client of the S3 REST API, scoped to one bucket.
///
/// Every request is signed by [`Signer`] and sent through the
/// [`s3sign_core::HttpSend`] of its context.
#[derive(Debug)]
pub struct S3Client {
    signer: Signer<Credential>,
    endpoint: Endpoint,
    bucket: Option<String>,
}

impl S3Client {
    pub fn new(
        ctx: s3sign_core::Context,
        endpoint: Endpoint,
        bucket: Option<&str>,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        let mut builder = RequestSigner::new();
        if endpoint.virtual_host {
            if let Some(bucket) = bucket {
                builder = builder.with_bucket(bucket);
            }
        }

        Self {
            signer: Signer::new(ctx, provider, builder),
            endpoint,
            bucket: bucket.map(|b| b.to_string()),
        }
    }

    fn url(&self, key: Option<&str>, query: &[(&str, &str)]) -> String {
        let Endpoint {
            scheme,
            authority,
            virtual_host,
        } = &self.endpoint;

        let mut url = match (&self.bucket, virtual_host) {
            (Some(bucket), true) => format!("{scheme}://{bucket}.{authority}/"),
            (Some(bucket), false) => format!("{scheme}://{authority}/{bucket}"),
            (None, _) => format!("{scheme}://{authority}/"),
        };
        if let Some(key) = key {
            if !url.ends_with('/') {
                url.push('/');
            }
            url.extend(utf8_percent_encode(key, &KEY_ENCODE_SET));
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(
                &form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(query)
                    .finish(),
            );
        }

        url
    }

    fn build(
        &self,
        method: Method,
        key: Option<&str>,
        query: &[(&str, &str)],
        body: Bytes,
    ) -> Result<Request<Bytes>> {
        let url = self.url(key, query);
        Request::builder()
            .method(method)
            .uri(&url)
            .body(body)
            .with_context(|| format!("invalid request url {url}"))
    }

    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        debug!("sending {} {}", req.method(), req.uri());

        let (mut parts, body) = req.into_parts();
        self.signer.sign(&mut parts, None).await?;
        let resp = self
            .signer
            .context()
            .http_send(Request::from_parts(parts, body))
            .await?;

        if !resp.status().is_success() {
            return Err(ServiceError::from_response(&resp).into());
        }
        Ok(resp)
    }

    pub async fn list_buckets(&self) -> Result<ListAllMyBucketsResult> {
        let resp = self
            .send(self.build(Method::GET, None, &[], Bytes::new())?)
            .await?;
        parse(&resp, "ListAllMyBucketsResult")
    }

    /// List one page of objects with the ListObjects (v1) API.
    pub async fn list_objects(
        &self,
        prefix: Option<&str>,
        delimiter: Option<&str>,
        marker: Option<&str>,
    ) -> Result<ListBucketResult> {
        let mut query = Vec::new();
        if let Some(v) = delimiter {
            query.push(("delimiter", v));
        }
        if let Some(v) = marker {
            query.push(("marker", v));
        }
        if let Some(v) = prefix {
            query.push(("prefix", v));
        }

        let resp = self
            .send(self.build(Method::GET, None, &query, Bytes::new())?)
            .await?;
        parse(&resp, "ListBucketResult")
    }

    pub async fn create_bucket(&self) -> Result<()> {
        self.send(self.build(Method::PUT, None, &[], Bytes::new())?)
            .await?;
        Ok(())
    }

    pub async fn delete_bucket(&self) -> Result<()> {
        self.send(self.build(Method::DELETE, None, &[], Bytes::new())?)
            .await?;
        Ok(())
    }

    pub async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<Option<String>> {
        let mut req = self.build(Method::PUT, Some(key), &[], body)?;
        if let Some(v) = content_type {
            req.headers_mut().insert(CONTENT_TYPE, v.parse()?);
        }

        let resp = self.send(req).await?;
        Ok(header_string(resp.headers(), &ETAG))
    }

    pub async fn get_object(&self, key: &str) -> Result<Bytes> {
        let resp = self
            .send(self.build(Method::GET, Some(key), &[], Bytes::new())?)
            .await?;
        Ok(resp.into_body())
    }

    pub async fn head_object(&self, key: &str) -> Result<ObjectMeta> {
        let resp = self
            .send(self.build(Method::HEAD, Some(key), &[], Bytes::new())?)
            .await?;
        let headers = resp.headers();

        Ok(ObjectMeta {
            content_length: header_string(headers, &CONTENT_LENGTH)
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            content_type: header_string(headers, &CONTENT_TYPE),
            e_tag: header_string(headers, &ETAG),
            last_modified: header_string(headers, &LAST_MODIFIED)
                .and_then(|v| parse_http_date(&v).ok()),
        })
    }

    pub async fn delete_object(&self, key: &str) -> Result<()> {
        self.send(self.build(Method::DELETE, Some(key), &[], Bytes::new())?)
            .await?;
        Ok(())
    }

    /// Delete up to 1000 keys with one request.
    pub async fn delete_objects(&self, keys: &[String]) -> Result<DeleteResult> {
        let body = quick_xml::se::to_string(&Delete {
            quiet: false,
            objects: keys
                .iter()
                .map(|key| ObjectIdentifier { key: key.clone() })
                .collect(),
        })?;

        let mut req = self.build(Method::POST, None, &[("delete", "")], Bytes::from(body))?;
        let md5 = base64_md5(req.body());
        req.headers_mut()
            .insert(CONTENT_MD5.clone(), HeaderValue::from_str(&md5)?);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));

        let resp = self.send(req).await?;
        parse(&resp, "DeleteResult")
    }

    pub async fn create_multipart_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<String> {
        let mut req = self.build(Method::POST, Some(key), &[("uploads", "")], Bytes::new())?;
        if let Some(v) = content_type {
            req.headers_mut().insert(CONTENT_TYPE, v.parse()?);
        }

        let resp = self.send(req).await?;
        let result: InitiateMultipartUploadResult = parse(&resp, "InitiateMultipartUploadResult")?;
        if result.upload_id.is_empty() {
            return Err(anyhow!("service returned no upload id for {key}"));
        }
        Ok(result.upload_id)
    }

    /// Upload one part and return its ETag.
    pub async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: usize,
        body: Bytes,
    ) -> Result<String> {
        let part_number = part_number.to_string();
        let resp = self
            .send(self.build(
                Method::PUT,
                Some(key),
                &[("partNumber", &part_number), ("uploadId", upload_id)],
                body,
            )?)
            .await?;

        header_string(resp.headers(), &ETAG)
            .ok_or_else(|| anyhow!("part {part_number} of {key} has no ETag"))
    }

    pub async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<()> {
        let body = quick_xml::se::to_string(&CompleteMultipartUpload { parts })?;
        let resp = self
            .send(self.build(
                Method::POST,
                Some(key),
                &[("uploadId", upload_id)],
                Bytes::from(body),
            )?)
            .await?;

        // Completion can fail after the service already answered 200.
        if resp.body().is_empty() {
            return Ok(());
        }
        let err: ErrorResponse = parse(&resp, "CompleteMultipartUploadResult")?;
        if !err.code.is_empty() {
            return Err(ServiceError {
                status: resp.status(),
                code: err.code,
                message: err.message,
                resource: err.resource,
                request_id: err.request_id,
            }
            .into());
        }
        Ok(())
    }

    pub async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        self.send(self.build(
            Method::DELETE,
            Some(key),
            &[("uploadId", upload_id)],
            Bytes::new(),
        )?)
        .await?;
        Ok(())
    }

    pub async fn list_multipart_uploads(&self) -> Result<ListMultipartUploadsResult> {
        let resp = self
            .send(self.build(Method::GET, None, &[("uploads", "")], Bytes::new())?)
            .await?;
        parse(&resp, "ListMultipartUploadsResult")
    }

    /// Presign a request for `key`, valid for `expires_in`.
    pub async fn presign(
        &self,
        method: Method,
        key: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let (mut parts, _) = self.build(method, Some(key), &[], Bytes::new())?.into_parts();
        self.signer.sign(&mut parts, Some(expires_in)).await?;
        Ok(parts.uri.to_string())
    }
}

fn parse<T: serde::de::DeserializeOwned>(resp: &Response<Bytes>, name: &str) -> Result<T> {
    let body = String::from_utf8_lossy(resp.body());
    de::from_str(&body).with_context(|| format!("failed to parse {name}"))
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
