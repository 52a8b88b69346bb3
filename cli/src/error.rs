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

use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

use crate::xml::ErrorResponse;

/// Failures to parse a `s3://` location.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location {0:?} must start with s3://")]
    MissingScheme(String),
    #[error("location {0:?} has no bucket")]
    MissingBucket(String),
    #[error("location {0:?} has no object key")]
    MissingKey(String),
}

/// Error returned by the object store.
#[derive(Debug, Error)]
#[error("{code} ({status}): {message}")]
pub struct ServiceError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub resource: Option<String>,
    pub request_id: Option<String>,
}

impl ServiceError {
    /// Build the error out of a failed response.
    ///
    /// Bodies that aren't an S3 `<Error>` document (HEAD responses, proxies)
    /// fall back to the status reason.
    pub fn from_response(resp: &http::Response<Bytes>) -> Self {
        let status = resp.status();
        let body = String::from_utf8_lossy(resp.body());

        match quick_xml::de::from_str::<ErrorResponse>(&body) {
            Ok(e) if !e.code.is_empty() => Self {
                status,
                code: e.code,
                message: e.message,
                resource: e.resource,
                request_id: e.request_id,
            },
            _ => Self {
                status,
                code: status.canonical_reason().unwrap_or("Unknown").to_string(),
                message: body.trim().to_string(),
                resource: None,
                request_id: None,
            },
        }
    }
}
