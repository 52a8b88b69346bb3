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

use chrono::{TimeZone, Utc};
use s3sign_aws_v2::{RequestSigner, StaticCredentialProvider};
use s3sign_core::time::DateTime;
use s3sign_core::{Context, Signer};

mod presigned;
mod standard;

fn signing_time() -> DateTime {
    Utc.with_ymd_and_hms(2022, 8, 15, 16, 50, 12)
        .single()
        .expect("time must be valid")
}

fn init_signer(time: DateTime) -> Signer<s3sign_aws_v2::Credential> {
    let _ = env_logger::builder().is_test(true).try_init();

    Signer::new(
        Context::new(),
        StaticCredentialProvider::new("AK", "SK"),
        RequestSigner::new().with_time(time),
    )
}
