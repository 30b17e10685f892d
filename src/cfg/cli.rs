// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{path::PathBuf, time::Duration};

use anyhow::{Result, ensure};
use clap::Parser;

use crate::client::file_transfer::TransferOptions;

/// Command-line surface of the file-transfer client.
///
/// clap already rejects missing required flags with usage on stderr and exit
/// code 2; [`Cli::validate`] covers the value checks clap cannot express
/// (non-empty strings, non-zero sizes).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ndn-ft-client",
    version,
    about = "Copy a file over NDN through a dense fixed-window Interest pipeline"
)]
pub struct Cli {
    /// The NDN Name prefix of all Interests expressed by this consumer.
    /// Specify a non-empty string
    #[arg(short, long)]
    pub prefix: String,

    /// The path of the file to be copied over NDN. Specify a non-empty string
    #[arg(short, long)]
    pub filepath: String,

    /// The file size in bytes. Specify a positive value
    #[arg(short = 's', long)]
    pub filesize: u64,

    /// Interests lifetime in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    pub lifetime: u64,

    /// The producer's payload size. Used by this consumer to compute the
    /// segment for each Interest
    #[arg(long = "payload-size", default_value_t = 1024)]
    pub payload_size: usize,

    /// The number of bytes a worker reads in one request round
    #[arg(short, long, default_value_t = 262_144)]
    pub chunk: u64,

    /// The number of workers to concurrently read the file
    #[arg(short = 't', long, default_value_t = 1)]
    pub nthreads: u16,

    /// Write the transferred bytes to this local path (omit to discard them)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Optional YAML runtime config (forwarder, window, logging)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Value checks beyond clap's reach. An error here means exit code 2.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.prefix.is_empty(), "invalid value for option '--prefix'");
        ensure!(
            !self.filepath.is_empty(),
            "invalid value for option '--filepath'"
        );
        ensure!(self.filesize > 0, "invalid value for option '--filesize'");
        ensure!(
            self.payload_size > 0,
            "invalid value for option '--payload-size'"
        );
        ensure!(self.chunk > 0, "invalid value for option '--chunk'");
        ensure!(self.nthreads > 0, "invalid value for option '--nthreads'");
        Ok(())
    }

    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            prefix: self.prefix.clone(),
            filepath: self.filepath.clone(),
            filesize: self.filesize,
            read_chunk: self.chunk,
            payload_size: self.payload_size,
            nthreads: self.nthreads,
            lifetime: Duration::from_millis(self.lifetime),
            output: self.output.clone(),
        }
    }
}
