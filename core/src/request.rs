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

use std::borrow::Cow;
use std::mem;
use std::str::FromStr;
use std::time::Duration;

use http::header::HeaderName;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::Method;
use http::Uri;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

use crate::Error;
use crate::Result;

/// AsciiSet used to encode query keys and values when a request is applied back.
///
/// Every byte except the unreserved characters `A-Z a-z 0-9 - . _ ~` is encoded.
pub static QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signing context for request.
///
/// It's built by taking the method, uri and headers out of
/// `http::request::Parts`, and must be applied back after signing.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as sent on the wire.
    pub path: String,
    /// HTTP query parameters, percent decoded, in their original order.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),

            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the context.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    ///
    /// The query string is re-encoded entirely from `query`.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        let query = self.query_encoded();

        // Return headers back.
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let paq = if query.is_empty() {
                    self.path
                } else {
                    let mut s = self.path;
                    s.reserve(query.len() + 1);
                    s.push('?');
                    s.push_str(&query);
                    s
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Render the query back into its percent encoded form.
    ///
    /// ```shell
    /// [(a, b c), (d, "")] => "a=b%20c&d"
    /// ```
    pub fn query_encoded(&self) -> String {
        let mut s = String::with_capacity(self.query_size() * 2);

        for (i, (k, v)) in self.query.iter().enumerate() {
            if i > 0 {
                s.push('&');
            }

            s.extend(utf8_percent_encode(k, &QUERY_ENCODE_SET));
            if !v.is_empty() {
                s.push('=');
                s.extend(utf8_percent_encode(v, &QUERY_ENCODE_SET));
            }
        }

        s
    }

    /// Get query size.
    #[inline]
    pub fn query_size(&self) -> usize {
        self.query
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
    }

    /// Push a new query pair into query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Get query value by filter.
    pub fn query_to_vec_with_filter(&self, filter: impl Fn(&str) -> bool) -> Vec<(String, String)> {
        self.query
            .iter()
            .filter(|(k, _)| filter(k))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Convert query to a string of sorted tokens.
    ///
    /// Each pair is rendered as `k` when the value is empty and as `k{sep}v`
    /// otherwise; the rendered tokens are sorted and joined.
    ///
    /// ```shell
    /// [(c, ""), (a, b)] => "a=b&c"
    /// ```
    pub fn query_to_string(query: Vec<(String, String)>, sep: &str, join: &str) -> String {
        let mut tokens = query
            .into_iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k
                } else {
                    format!("{k}{sep}{v}")
                }
            })
            .collect::<Vec<_>>();
        tokens.sort_unstable();

        tokens.join(join)
    }

    /// Get header value by name.
    ///
    /// Returns empty string if header not found. Bytes that are not valid
    /// utf-8 are replaced instead of failing.
    #[inline]
    pub fn header_get_or_default(&self, key: &HeaderName) -> Cow<str> {
        match self.headers.get(key) {
            Some(v) => String::from_utf8_lossy(v.as_bytes()),
            None => Cow::Borrowed(""),
        }
    }

    /// Get headers with given prefix.
    ///
    /// Header names are returned lowercased. A header that appears several
    /// times yields one entry with its values joined by `,`.
    pub fn header_to_vec_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        self.headers
            .keys()
            // Filter all header that starts with prefix
            .filter(|k| k.as_str().starts_with(prefix))
            .map(|k| {
                let values = self
                    .headers
                    .get_all(k)
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()))
                    .collect::<Vec<_>>();

                (k.as_str().to_lowercase(), values.join(","))
            })
            .collect()
    }

    /// Convert sorted headers to string.
    ///
    /// ```shell
    /// [(c, d), (a, b)] => "a:b\nc:d"
    /// ```
    pub fn header_to_string(mut headers: Vec<(String, String)>, sep: &str, join: &str) -> String {
        let mut s = String::with_capacity(16);

        // Sort via header name.
        headers.sort();

        for (idx, (k, v)) in headers.into_iter().enumerate() {
            if idx != 0 {
                s.push_str(join);
            }

            s.push_str(&k);
            s.push_str(sep);
            s.push_str(&v);
        }

        s
    }
}

/// SigningMethod is the method that used in signing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SigningMethod {
    /// Signing with header.
    Header,
    /// Signing with query.
    Query(Duration),
}
