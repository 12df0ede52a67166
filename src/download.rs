// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Corpus download utility
//!
//! Fetches the FakeTrue.Br paired corpus (plain CSV) and optionally verifies
//! its SHA-256 checksum.

use anyhow::{Context, Result};
use clap::Parser;
use fakenews_detector::corpus::{Corpus, Label, FAKETRUE_BR_URL};
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "download-corpus")]
#[command(about = "Download the FakeTrue.Br news corpus")]
#[command(version)]
struct Args {
    /// Source URL
    #[arg(short, long, default_value = FAKETRUE_BR_URL)]
    url: String,

    /// Output file
    #[arg(short, long, default_value = "data/FakeTrueBr_corpus.csv")]
    output: PathBuf,

    /// Expected SHA-256 of the file (hex)
    #[arg(long)]
    sha256: Option<String>,

    /// Force re-download even if the file exists
    #[arg(short, long)]
    force: bool,
}

/// Stream `url` into `output_path`, returning the hex SHA-256 of the content
fn download_file(url: &str, output_path: &Path) -> Result<String> {
    tracing::info!("Downloading from: {}", url);

    let mut response = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(600))
        .build()?
        .get(url)
        .send()
        .context("Failed to send request")?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    // Written next to the target and renamed once complete
    let partial_path = output_path.with_extension("part");
    let mut file = File::create(&partial_path)
        .with_context(|| format!("Failed to create output file: {}", partial_path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = response.read(&mut buffer).context("Failed to read response")?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        hasher.update(&buffer[..bytes_read]);
        pb.inc(bytes_read as u64);
    }
    file.flush()?;
    drop(file);

    std::fs::rename(&partial_path, output_path)
        .with_context(|| format!("Failed to move download to {}", output_path.display()))?;

    pb.finish_with_message("Downloaded");
    Ok(hex::encode(hasher.finalize()))
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn verify_sha256(actual: &str, expected: &str) -> bool {
    let matches = actual.eq_ignore_ascii_case(expected.trim());
    if matches {
        tracing::info!("Checksum verified: {}", actual);
    } else {
        tracing::warn!("Checksum mismatch: expected {}, got {}", expected, actual);
    }
    matches
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    tracing::info!("Corpus Download Utility");
    tracing::info!("=======================");

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let digest = if args.output.exists() && !args.force {
        tracing::info!("Corpus already exists: {}", args.output.display());
        tracing::info!("Use --force to re-download");
        sha256_file(&args.output)?
    } else {
        download_file(&args.url, &args.output)?
    };

    if let Some(expected) = &args.sha256 {
        if !verify_sha256(&digest, expected) {
            anyhow::bail!("Checksum verification failed for {}", args.output.display());
        }
    }

    // The file must parse as a corpus
    let corpus = Corpus::load_csv(&args.output)?;
    let dist = corpus.label_distribution();

    println!("\n{}", "=".repeat(60));
    println!("Corpus Ready");
    println!("{}", "=".repeat(60));
    println!("  File:     {}", args.output.display());
    println!("  SHA-256:  {}", digest);
    println!("  Records:  {}", corpus.len());
    println!("  Examples: {}", corpus.example_count());
    for label in Label::ALL {
        println!("    {}: {}", label, dist.get(&label).copied().unwrap_or(0));
    }

    Ok(())
}
