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

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use bytes::Bytes;
use log::{info, warn};
use s3sign_core::time::parse_rfc3339;
use s3sign_core::{Context, OsEnv};
use s3sign_file_read_tokio::TokioFileRead;
use s3sign_http_send_reqwest::ReqwestHttpSend;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::args::{Cli, Command};
use crate::client::S3Client;
use crate::config::ClientConfig;
use crate::location::S3Location;
use crate::xml::CompletedPart;

/// Most parts a single multipart upload may have.
const MAX_PARTS: u64 = 10_000;

/// Max keys accepted by one multi-object delete.
const DELETE_BATCH_SIZE: usize = 1000;

pub async fn execute(cli: Cli) -> Result<()> {
    let cfg = ClientConfig::from_args(&cli.global)?;
    let ctx = Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let mut out = std::io::stdout();

    match cli.command {
        Command::Ls {
            location: None, ..
        } => list_buckets(&cfg.client(&ctx, None), &mut out).await,
        Command::Ls {
            location: Some(loc),
            recursive,
        } => {
            let client = cfg.client(&ctx, Some(&loc.bucket));
            list_objects(&client, loc.key.as_deref(), recursive, &mut out).await
        }
        Command::Mb { location } => {
            cfg.client(&ctx, Some(&location.bucket))
                .create_bucket()
                .await
                .with_context(|| format!("failed to create bucket {location}"))?;
            writeln!(out, "created {location}")?;
            Ok(())
        }
        Command::Rb { location } => {
            cfg.client(&ctx, Some(&location.bucket))
                .delete_bucket()
                .await
                .with_context(|| format!("failed to remove bucket {location}"))?;
            writeln!(out, "removed {location}")?;
            Ok(())
        }
        Command::Put {
            file,
            location,
            part_size,
            content_type,
        } => {
            let client = cfg.client(&ctx, Some(&location.bucket));
            put(
                &client,
                &file,
                location.object_key()?,
                part_size,
                content_type.as_deref(),
            )
            .await
            .with_context(|| format!("failed to upload {} to {location}", file.display()))?;
            writeln!(out, "uploaded {} to {location}", file.display())?;
            Ok(())
        }
        Command::Get { location, file } => {
            let client = cfg.client(&ctx, Some(&location.bucket));
            get(&client, location.object_key()?, file.as_deref())
                .await
                .with_context(|| format!("failed to download {location}"))
        }
        Command::Stat { location } => {
            let client = cfg.client(&ctx, Some(&location.bucket));
            stat(&client, &location, &mut out).await
        }
        Command::Rm { locations } => remove(&cfg, &ctx, &locations, &mut out).await,
        Command::Uploads { location } => {
            let client = cfg.client(&ctx, Some(&location.bucket));
            list_uploads(&client, &mut out).await
        }
        Command::Abort {
            location,
            upload_id,
        } => {
            cfg.client(&ctx, Some(&location.bucket))
                .abort_multipart_upload(location.object_key()?, &upload_id)
                .await
                .with_context(|| format!("failed to abort upload {upload_id} of {location}"))?;
            writeln!(out, "aborted {upload_id}")?;
            Ok(())
        }
        Command::Presign {
            location,
            expires,
            method,
        } => {
            let url = cfg
                .client(&ctx, Some(&location.bucket))
                .presign(
                    method.into(),
                    location.object_key()?,
                    Duration::from_secs(expires),
                )
                .await?;
            writeln!(out, "{url}")?;
            Ok(())
        }
    }
}

async fn list_buckets(client: &S3Client, out: &mut impl Write) -> Result<()> {
    let result = client
        .list_buckets()
        .await
        .context("failed to list buckets")?;
    for bucket in result.buckets.bucket {
        writeln!(out, "{} {}", display_time(&bucket.creation_date), bucket.name)?;
    }
    Ok(())
}

/// List every page under `prefix`, following markers.
async fn list_objects(
    client: &S3Client,
    prefix: Option<&str>,
    recursive: bool,
    out: &mut impl Write,
) -> Result<()> {
    let delimiter = (!recursive).then_some("/");
    let mut marker: Option<String> = None;

    loop {
        let page = client
            .list_objects(prefix, delimiter, marker.as_deref())
            .await
            .context("failed to list objects")?;

        for p in &page.common_prefixes {
            writeln!(out, "{:>30} {}", "PRE", p.prefix)?;
        }
        for o in &page.contents {
            writeln!(
                out,
                "{} {:>10} {}",
                display_time(&o.last_modified),
                o.size,
                o.key
            )?;
        }

        match page.next_marker() {
            Some(next) => marker = Some(next),
            None => return Ok(()),
        }
    }
}

async fn put(
    client: &S3Client,
    file: &Path,
    key: &str,
    part_size: u64,
    content_type: Option<&str>,
) -> Result<()> {
    let mut f = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("failed to open {}", file.display()))?;
    let size = f.metadata().await?.len();

    if size <= part_size {
        let mut buf = Vec::with_capacity(size as usize);
        f.read_to_end(&mut buf).await?;
        client
            .put_object(key, Bytes::from(buf), content_type)
            .await?;
        return Ok(());
    }

    if size.div_ceil(part_size) > MAX_PARTS {
        bail!(
            "{} ({size} bytes) needs more than {MAX_PARTS} parts of {part_size} bytes, use a larger --part-size",
            file.display()
        );
    }

    info!("uploading {} ({size} bytes) in parts of {part_size} bytes", file.display());
    multipart_upload(client, &mut f, key, part_size, content_type).await
}

/// Upload `reader` as a multipart upload, aborting it on any failure.
async fn multipart_upload<R: AsyncRead + Unpin>(
    client: &S3Client,
    reader: &mut R,
    key: &str,
    part_size: u64,
    content_type: Option<&str>,
) -> Result<()> {
    let upload_id = client.create_multipart_upload(key, content_type).await?;

    let result = async {
        let parts = upload_parts(client, reader, key, &upload_id, part_size).await?;
        client
            .complete_multipart_upload(key, &upload_id, parts)
            .await
    }
    .await;

    if let Err(err) = result {
        warn!("aborting upload {upload_id} of {key}: {err:#}");
        if let Err(abort_err) = client.abort_multipart_upload(key, &upload_id).await {
            warn!("failed to abort upload {upload_id}: {abort_err:#}");
        }
        return Err(err);
    }
    Ok(())
}

async fn upload_parts<R: AsyncRead + Unpin>(
    client: &S3Client,
    reader: &mut R,
    key: &str,
    upload_id: &str,
    part_size: u64,
) -> Result<Vec<CompletedPart>> {
    let mut parts = Vec::new();

    for part_number in 1.. {
        let mut buf = Vec::new();
        (&mut *reader).take(part_size).read_to_end(&mut buf).await?;
        if buf.is_empty() && part_number > 1 {
            break;
        }

        let full = buf.len() as u64 == part_size;
        let e_tag = client
            .upload_part(key, upload_id, part_number, Bytes::from(buf))
            .await?;
        parts.push(CompletedPart { part_number, e_tag });

        if !full {
            break;
        }
    }

    Ok(parts)
}

async fn get(client: &S3Client, key: &str, file: Option<&Path>) -> Result<()> {
    let data = client.get_object(key).await?;

    match file {
        Some(path) => tokio::fs::write(path, &data)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn stat(client: &S3Client, location: &S3Location, out: &mut impl Write) -> Result<()> {
    let meta = client
        .head_object(location.object_key()?)
        .await
        .with_context(|| format!("failed to stat {location}"))?;

    writeln!(out, "Name      : {location}")?;
    writeln!(out, "Size      : {}", meta.content_length)?;
    if let Some(v) = meta.content_type {
        writeln!(out, "Type      : {v}")?;
    }
    if let Some(v) = meta.e_tag {
        writeln!(out, "ETag      : {v}")?;
    }
    if let Some(v) = meta.last_modified {
        writeln!(out, "Modified  : {}", v.format("%Y-%m-%d %H:%M:%S"))?;
    }
    Ok(())
}

async fn remove(
    cfg: &ClientConfig,
    ctx: &Context,
    locations: &[S3Location],
    out: &mut impl Write,
) -> Result<()> {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for loc in locations {
        groups
            .entry(loc.bucket.as_str())
            .or_default()
            .push(loc.object_key()?.to_string());
    }

    for (bucket, keys) in groups {
        remove_objects(&cfg.client(ctx, Some(bucket)), bucket, &keys, out).await?;
    }
    Ok(())
}

async fn remove_objects(
    client: &S3Client,
    bucket: &str,
    keys: &[String],
    out: &mut impl Write,
) -> Result<()> {
    if let [key] = keys {
        client
            .delete_object(key)
            .await
            .with_context(|| format!("failed to remove s3://{bucket}/{key}"))?;
        writeln!(out, "removed s3://{bucket}/{key}")?;
        return Ok(());
    }

    let mut failed = 0;
    for batch in keys.chunks(DELETE_BATCH_SIZE) {
        let result = client
            .delete_objects(batch)
            .await
            .with_context(|| format!("failed to remove objects from s3://{bucket}"))?;

        for d in result.deleted {
            writeln!(out, "removed s3://{bucket}/{}", d.key)?;
        }
        for e in &result.errors {
            warn!("failed to remove s3://{bucket}/{}: {} {}", e.key, e.code, e.message);
        }
        failed += result.errors.len();
    }

    if failed > 0 {
        bail!("failed to remove {failed} objects from s3://{bucket}");
    }
    Ok(())
}

async fn list_uploads(client: &S3Client, out: &mut impl Write) -> Result<()> {
    let result = client
        .list_multipart_uploads()
        .await
        .context("failed to list multipart uploads")?;
    if result.is_truncated {
        warn!("only the first page of multipart uploads is listed");
    }
    for u in result.uploads {
        writeln!(
            out,
            "{} {} {}",
            display_time(&u.initiated),
            u.upload_id,
            u.key
        )?;
    }
    Ok(())
}

/// Render service timestamps like `2022-08-15T16:50:12.000Z` in local
/// listing format, or verbatim when they can't be parsed.
fn display_time(s: &str) -> String {
    parse_rfc3339(s)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| s.to_string())
}
