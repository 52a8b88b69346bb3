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

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::location::S3Location;

/// Command line client for S3-compatible object stores.
#[derive(Debug, Parser)]
#[command(name = "s3sign", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Service endpoint, like `https://s3.amazonaws.com` or `http://127.0.0.1:9000`.
    #[arg(
        long,
        global = true,
        env = "S3_ENDPOINT",
        default_value = "https://s3.amazonaws.com"
    )]
    pub endpoint: String,

    /// Profile to read from the shared credentials and config files.
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Access key id.
    #[arg(long, global = true, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret access key.
    #[arg(long, global = true, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Address buckets as `bucket.endpoint` instead of `endpoint/bucket`.
    #[arg(long, global = true)]
    pub virtual_host: bool,

    /// Send requests unsigned.
    #[arg(long, global = true)]
    pub anonymous: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List buckets, or objects under a bucket and prefix.
    Ls {
        /// `s3://bucket[/prefix]`; lists buckets when omitted.
        location: Option<S3Location>,
        /// List every object under the prefix instead of one level.
        #[arg(short, long)]
        recursive: bool,
    },
    /// Create a bucket.
    Mb { location: S3Location },
    /// Remove an empty bucket.
    Rb { location: S3Location },
    /// Upload a file.
    Put {
        file: PathBuf,
        location: S3Location,
        /// Files larger than this are sent as a multipart upload.
        #[arg(long, default_value_t = 8 * 1024 * 1024, value_parser = clap::value_parser!(u64).range(5 * 1024 * 1024..))]
        part_size: u64,
        /// Content-Type of the object.
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Download an object to a file, or stdout when no file is given.
    Get {
        location: S3Location,
        file: Option<PathBuf>,
    },
    /// Show object metadata.
    Stat { location: S3Location },
    /// Remove objects.
    Rm {
        #[arg(required = true)]
        locations: Vec<S3Location>,
    },
    /// List in-progress multipart uploads of a bucket.
    Uploads { location: S3Location },
    /// Abort a multipart upload.
    Abort {
        location: S3Location,
        upload_id: String,
    },
    /// Print a presigned url for an object.
    Presign {
        location: S3Location,
        /// Seconds the url stays valid.
        #[arg(long, default_value_t = 3600)]
        expires: u64,
        #[arg(long, value_enum, default_value_t = PresignMethod::Get)]
        method: PresignMethod,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresignMethod {
    Get,
    Put,
}

impl From<PresignMethod> for http::Method {
    fn from(m: PresignMethod) -> Self {
        match m {
            PresignMethod::Get => http::Method::GET,
            PresignMethod::Put => http::Method::PUT,
        }
    }
}
