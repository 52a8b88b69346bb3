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

//! Canonicalization of a pending request into the signature v2 StringToSign.
//!
//! ## Format
//!
//! ```text
//! HTTP-Verb + "\n" +
//! Content-MD5 + "\n" +
//! Content-Type + "\n" +
//! Date-or-Expires + "\n" +
//! CanonicalizedAmzHeaders +
//! CanonicalizedResource;
//! ```
//!
//! ## Reference
//!
//! - [Signing and Authenticating REST Requests](https://docs.aws.amazon.com/AmazonS3/latest/userguide/RESTAuthentication.html)

use http::header::{HeaderName, CONTENT_TYPE};
use s3sign_core::SigningRequest;

use crate::constants::{CONTENT_MD5, SUBRESOURCES, X_AMZ_PREFIX};

/// Build the StringToSign of a request.
///
/// `date_or_expires` is the value of the `Date` header for header signing
/// (empty when `x-amz-date` is used instead), or the expiry in epoch seconds
/// for presigned urls. `bucket` is set for virtual-hosted requests, whose
/// path doesn't carry the bucket name.
pub fn string_to_sign(req: &SigningRequest, date_or_expires: &str, bucket: Option<&str>) -> String {
    let content_md5 = req.header_get_or_default(&HeaderName::from_static(CONTENT_MD5));
    let content_type = req.header_get_or_default(&CONTENT_TYPE);

    format!(
        "{}\n{}\n{}\n{}\n{}{}",
        req.method.as_str(),
        content_md5,
        content_type,
        date_or_expires,
        canonicalize_amz_headers(req),
        canonicalize_resource(req, bucket)
    )
}

/// Render every `x-amz-*` header as a `name:value\n` line, sorted by name.
///
/// Repeated headers are folded into one line with their values joined by
/// `,`. Returns an empty string when the request has no such header.
pub fn canonicalize_amz_headers(req: &SigningRequest) -> String {
    let headers = req.header_to_vec_with_prefix(X_AMZ_PREFIX);
    if headers.is_empty() {
        return String::new();
    }

    let mut s = SigningRequest::header_to_string(headers, ":", "\n");
    s.push('\n');
    s
}

/// Render the resource: `[/bucket]` + path + sorted sub-resources.
///
/// Query parameters outside of the sub-resource set are left out.
pub fn canonicalize_resource(req: &SigningRequest, bucket: Option<&str>) -> String {
    let mut s = String::new();
    if let Some(bucket) = bucket {
        s.push('/');
        s.push_str(bucket);
    }

    if req.path.is_empty() {
        s.push('/');
    } else {
        s.push_str(&req.path);
    }

    let params = req.query_to_vec_with_filter(is_sub_resource);
    if !params.is_empty() {
        s.push('?');
        s.push_str(&SigningRequest::query_to_string(params, "=", "&"));
    }

    s
}

fn is_sub_resource(param: &str) -> bool {
    SUBRESOURCES.contains(param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;

    fn build(req: http::Request<()>) -> SigningRequest {
        let (mut parts, _) = req.into_parts();
        SigningRequest::build(&mut parts).expect("request must be valid")
    }

    #[test]
    fn test_string_to_sign_minimal() {
        let req = build(
            http::Request::get("http://s3.example.com/b/k")
                .body(())
                .expect("request must be valid"),
        );

        assert_eq!(
            string_to_sign(&req, "Mon, 15 Aug 2022 16:50:12 GMT", None),
            "GET\n\n\nMon, 15 Aug 2022 16:50:12 GMT\n/b/k"
        );
    }

    #[test]
    fn test_string_to_sign_full() {
        let req = build(
            http::Request::put("http://s3.example.com/b/k?uploadId=xyz&random=value&partNumber=2")
                .header("Content-MD5", "ZajifYh5KDgxtmS9i38K1A==")
                .header("Content-Type", "text/plain")
                .header("X-Amz-Meta-A", "1")
                .header("x-amz-meta-a", "2")
                .header("x-amz-acl", "public-read")
                .header("x-custom", "ignored")
                .body(())
                .expect("request must be valid"),
        );

        assert_eq!(
            string_to_sign(&req, "Mon, 15 Aug 2022 16:50:12 GMT", None),
            "PUT\nZajifYh5KDgxtmS9i38K1A==\ntext/plain\nMon, 15 Aug 2022 16:50:12 GMT\n\
             x-amz-acl:public-read\nx-amz-meta-a:1,2\n\
             /b/k?partNumber=2&uploadId=xyz"
        );
    }

    #[test]
    fn test_canonicalize_amz_headers() {
        let mut req = build(
            http::Request::get("http://s3.example.com/b/k")
                .body(())
                .expect("request must be valid"),
        );
        assert_eq!(canonicalize_amz_headers(&req), "");

        req.headers
            .insert("x-amz-meta-z", HeaderValue::from_static("last"));
        req.headers
            .insert("x-amz-date", HeaderValue::from_static("now"));
        req.headers
            .insert("content-length", HeaderValue::from_static("0"));
        assert_eq!(
            canonicalize_amz_headers(&req),
            "x-amz-date:now\nx-amz-meta-z:last\n"
        );
    }

    #[test]
    fn test_canonicalize_resource_sorts_sub_resources() {
        let req = build(
            http::Request::get("http://s3.example.com/bucket/key?uploads&acl")
                .body(())
                .expect("request must be valid"),
        );
        assert_eq!(canonicalize_resource(&req, None), "/bucket/key?acl&uploads");
    }

    #[test]
    fn test_canonicalize_resource_excludes_other_params() {
        let req = build(
            http::Request::get("http://s3.example.com/bucket?prefix=a&delimiter=%2F&marker=m")
                .body(())
                .expect("request must be valid"),
        );
        assert_eq!(canonicalize_resource(&req, None), "/bucket");
    }

    #[test]
    fn test_canonicalize_resource_is_case_sensitive() {
        let req = build(
            http::Request::get("http://s3.example.com/b/k?ACL&Uploads")
                .body(())
                .expect("request must be valid"),
        );
        assert_eq!(canonicalize_resource(&req, None), "/b/k");
    }

    #[test]
    fn test_canonicalize_resource_response_overrides() {
        let req = build(
            http::Request::get(
                "http://s3.example.com/b/k?response-content-type=text%2Fplain&versionId=3",
            )
            .body(())
            .expect("request must be valid"),
        );
        assert_eq!(
            canonicalize_resource(&req, None),
            "/b/k?response-content-type=text/plain&versionId=3"
        );
    }

    #[test]
    fn test_canonicalize_resource_virtual_host() {
        let req = build(
            http::Request::get("http://b.s3.example.com/k?acl")
                .body(())
                .expect("request must be valid"),
        );
        assert_eq!(canonicalize_resource(&req, Some("b")), "/b/k?acl");

        let req = build(
            http::Request::get("http://b.s3.example.com")
                .body(())
                .expect("request must be valid"),
        );
        assert_eq!(canonicalize_resource(&req, Some("b")), "/b/");
    }

    #[test]
    fn test_canonicalize_resource_root() {
        let req = build(
            http::Request::get("http://s3.example.com")
                .body(())
                .expect("request must be valid"),
        );
        assert_eq!(canonicalize_resource(&req, None), "/");
    }
}
