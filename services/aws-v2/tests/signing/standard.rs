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

use http::header::{AUTHORIZATION, DATE};
use pretty_assertions::assert_eq;
use s3sign_aws_v2::string_to_sign;
use s3sign_core::hash::base64_hmac_sha1;
use s3sign_core::SigningRequest;

use super::{init_signer, signing_time};

#[tokio::test]
async fn test_sign_get_object() -> anyhow::Result<()> {
    let signer = init_signer(signing_time());

    let (mut parts, _) = http::Request::get("http://s3.example.com/b/k")
        .body(())?
        .into_parts();
    signer.sign(&mut parts, None).await?;

    let date = parts.headers[DATE].to_str()?.to_string();
    let expected = format!(
        "AWS AK:{}",
        base64_hmac_sha1(b"SK", format!("GET\n\n\n{date}\n/b/k").as_bytes())
    );
    assert_eq!(parts.headers[AUTHORIZATION].to_str()?, expected);
    Ok(())
}

#[tokio::test]
async fn test_sign_put_object_with_headers() -> anyhow::Result<()> {
    let signer = init_signer(signing_time());

    let (mut parts, _) =
        http::Request::put("http://s3.example.com/b/k?partNumber=2&uploadId=xyz&random=value")
            .header("Content-MD5", "ZajifYh5KDgxtmS9i38K1A==")
            .header("Content-Type", "text/plain")
            .header("x-amz-meta-a", "1")
            .header("x-amz-acl", "public-read")
            .header("x-amz-meta-a", "2")
            .body(())?
            .into_parts();
    signer.sign(&mut parts, None).await?;

    assert_eq!(
        parts.headers[AUTHORIZATION].to_str()?,
        "AWS AK:ECmQR+UMeQHntc5EGgDzPMUtpoc="
    );
    // Parameters outside of the sub-resource set stay on the request.
    assert_eq!(
        parts.uri.query(),
        Some("partNumber=2&uploadId=xyz&random=value")
    );
    Ok(())
}

#[tokio::test]
async fn test_sign_list_buckets() -> anyhow::Result<()> {
    let signer = init_signer(signing_time());

    let (mut parts, _) = http::Request::get("http://s3.example.com")
        .body(())?
        .into_parts();
    signer.sign(&mut parts, None).await?;

    assert_eq!(
        parts.headers[AUTHORIZATION].to_str()?,
        "AWS AK:T4AebmyK1g3xjYQkjfTBhSZnNJ0="
    );
    Ok(())
}

#[test]
fn test_amz_headers_order_is_stable() -> anyhow::Result<()> {
    let build = |first: (&str, &str), second: (&str, &str)| -> anyhow::Result<String> {
        let (mut parts, _) = http::Request::get("http://s3.example.com/b/k")
            .header(first.0, first.1)
            .header(second.0, second.1)
            .body(())?
            .into_parts();
        let req = SigningRequest::build(&mut parts)?;
        Ok(string_to_sign(&req, "date", None))
    };

    let expected = "GET\n\n\ndate\nx-amz-meta-a:1\nx-amz-meta-b:2\n/b/k";
    assert_eq!(
        build(("x-amz-meta-b", "2"), ("x-amz-meta-a", "1"))?,
        expected
    );
    assert_eq!(
        build(("x-amz-meta-a", "1"), ("x-amz-meta-b", "2"))?,
        expected
    );
    Ok(())
}
