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

use pretty_assertions::assert_eq;
use s3sign_aws_v2::{Credential, RequestSigner};
use s3sign_core::hash::base64_hmac_sha1;

use super::{init_signer, signing_time};

fn query_value(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn test_presign_get_object() -> anyhow::Result<()> {
    let signer = init_signer(signing_time());

    let (mut parts, _) = http::Request::get("http://s3.example.com/b/k")
        .body(())?
        .into_parts();
    signer
        .sign(&mut parts, Some(Duration::from_secs(3600)))
        .await?;
    let url = parts.uri.to_string();

    let expires = signing_time().timestamp() + 3600;
    assert_eq!(query_value(&url, "AWSAccessKeyId").as_deref(), Some("AK"));
    assert_eq!(query_value(&url, "Expires"), Some(expires.to_string()));
    assert_eq!(
        query_value(&url, "Signature"),
        Some(base64_hmac_sha1(
            b"SK",
            format!("GET\n\n\n{expires}\n/b/k").as_bytes()
        ))
    );
    Ok(())
}

#[test]
fn test_presign_preserves_existing_query() -> anyhow::Result<()> {
    let signer = RequestSigner::new().with_time(signing_time());

    let (mut parts, _) =
        http::Request::get("http://s3.example.com/b/k?response-content-type=text%2Fplain&x=1")
            .body(())?
            .into_parts();
    let url = signer.presign_url(
        &mut parts,
        &Credential::new("AK", "SK"),
        Duration::from_secs(60),
    )?;

    assert!(url.starts_with(
        "http://s3.example.com/b/k?response-content-type=text%2Fplain&x=1&AWSAccessKeyId=AK&"
    ));
    let expires = signing_time().timestamp() + 60;
    assert_eq!(
        query_value(&url, "Signature"),
        Some(base64_hmac_sha1(
            b"SK",
            format!("GET\n\n\n{expires}\n/b/k?response-content-type=text/plain").as_bytes()
        ))
    );
    Ok(())
}

#[test]
fn test_presign_depends_on_time() -> anyhow::Result<()> {
    let presign = |time: s3sign_core::time::DateTime| -> anyhow::Result<Option<String>> {
        let (mut parts, _) = http::Request::get("http://s3.example.com/b/k")
            .body(())?
            .into_parts();
        let url = RequestSigner::new().with_time(time).presign_url(
            &mut parts,
            &Credential::new("AK", "SK"),
            Duration::from_secs(3600),
        )?;
        Ok(query_value(&url, "Signature"))
    };

    let first = presign(signing_time())?;
    let second = presign(signing_time() + chrono::TimeDelta::seconds(1))?;
    assert!(first.is_some());
    assert_ne!(first, second);
    Ok(())
}
