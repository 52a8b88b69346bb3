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

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::LocationError;

/// A `s3://bucket[/key]` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    /// Object key or prefix, `None` when empty.
    pub key: Option<String>,
}

impl S3Location {
    /// Key of an object location, failing for bare buckets.
    pub fn object_key(&self) -> Result<&str, LocationError> {
        self.key
            .as_deref()
            .ok_or_else(|| LocationError::MissingKey(self.to_string()))
    }
}

impl FromStr for S3Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("s3://")
            .ok_or_else(|| LocationError::MissingScheme(s.to_string()))?;

        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, Some(key)),
            None => (rest, None),
        };
        if bucket.is_empty() {
            return Err(LocationError::MissingBucket(s.to_string()));
        }

        Ok(S3Location {
            bucket: bucket.to_string(),
            key: key.filter(|k| !k.is_empty()).map(|k| k.to_string()),
        })
    }
}

impl Display for S3Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}", self.bucket)?;
        if let Some(key) = &self.key {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_location() {
        let cases = vec![
            ("s3://bucket", "bucket", None),
            ("s3://bucket/", "bucket", None),
            ("s3://bucket/key", "bucket", Some("key")),
            ("s3://bucket/dir/sub/key.txt", "bucket", Some("dir/sub/key.txt")),
            ("s3://bucket/prefix/", "bucket", Some("prefix/")),
        ];

        for (input, bucket, key) in cases {
            let loc: S3Location = input.parse().expect("location must be valid");
            assert_eq!(loc.bucket, bucket, "input: {input}");
            assert_eq!(loc.key.as_deref(), key, "input: {input}");
        }
    }

    #[test]
    fn test_parse_invalid_location() {
        assert!(matches!(
            "bucket/key".parse::<S3Location>(),
            Err(LocationError::MissingScheme(_))
        ));
        assert!(matches!(
            "s3:///key".parse::<S3Location>(),
            Err(LocationError::MissingBucket(_))
        ));
    }

    #[test]
    fn test_object_key() {
        let loc: S3Location = "s3://bucket".parse().expect("location must be valid");
        assert!(loc.object_key().is_err());

        let loc: S3Location = "s3://bucket/a/b".parse().expect("location must be valid");
        assert_eq!(loc.object_key().expect("key must exist"), "a/b");
        assert_eq!(loc.to_string(), "s3://bucket/a/b");
    }
}
