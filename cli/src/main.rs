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

//! s3sign - command line client for S3-compatible object stores.
//!
//! Requests are authenticated with AWS Signature Version 2. Set `RUST_LOG=debug`
//! to see every request and the string it was signed over.

use std::process::ExitCode;

use clap::Parser;

mod args;
mod client;
mod commands;
mod config;
mod error;
mod location;
#[cfg(test)]
mod mock;
mod xml;

use args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match commands::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if let Some(e) = err.downcast_ref::<error::ServiceError>() {
                if let Some(resource) = &e.resource {
                    eprintln!("resource: {resource}");
                }
                if let Some(id) = &e.request_id {
                    eprintln!("request id: {id}");
                }
            }
            ExitCode::FAILURE
        }
    }
}
