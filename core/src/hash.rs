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

//! Hash related utils.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use hmac::Hmac;
use hmac::Mac;
use md5::Digest;
use md5::Md5;
use sha1::Sha1;

/// Base64 encode
pub fn base64_encode(content: &[u8]) -> String {
    BASE64_STANDARD.encode(content)
}

/// Base64 encoded HMAC with SHA1 hash.
///
/// This is the signature primitive of AWS Signature Version 2.
pub fn base64_hmac_sha1(key: &[u8], content: &[u8]) -> String {
    // SAFETY: HMAC's new_from_slice always returns Ok - it handles any key length
    let mut h = Hmac::<Sha1>::new_from_slice(key).unwrap();
    h.update(content);

    base64_encode(&h.finalize().into_bytes())
}

/// Base64 encoded MD5 hash, the format expected by the `Content-MD5` header.
pub fn base64_md5(content: &[u8]) -> String {
    base64_encode(Md5::digest(content).as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_hmac_sha1() {
        let cases = vec![
            ("key", "data", "EEFSxb/coHvGM+69RhmfAlXJ9J0="),
            ("key2", "data", "otRrDCWLu9bV7he/9iXeVEqMBkk="),
        ];

        for (key, data, expected) in cases {
            assert_eq!(
                base64_hmac_sha1(key.as_bytes(), data.as_bytes()),
                expected,
                "Failed on key: {key}"
            );
        }
    }

    #[test]
    fn test_base64_hmac_sha1_is_deterministic() {
        let first = base64_hmac_sha1(b"secret", b"GET\n\n\n\n/bucket/key");
        let second = base64_hmac_sha1(b"secret", b"GET\n\n\n\n/bucket/key");
        assert_eq!(first, second);
    }

    #[test]
    fn test_base64_md5() {
        assert_eq!(base64_md5(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
        assert_eq!(base64_md5(b"Hello, World!"), "ZajifYh5KDgxtmS9i38K1A==");
    }
}
