// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{process, sync::Arc};

use clap::Parser;
use ndn_ft_client_rs::{
    cfg::{cli::Cli, config::Config, logger::init_logger},
    client::file_transfer::FileTransferRunner,
    face::udp::UdpFace,
    pipeline::fixed::Pipeline,
};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // clap exits with code 2 itself when required flags are missing.
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        eprintln!("ERROR: {e}");
        process::exit(2);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path),
        None => Ok(Config::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            process::exit(2);
        },
    };

    let _logger_guard = match init_logger(&config.logger) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            process::exit(2);
        },
    };

    info!("starting NDN file-transfer client");

    let face = match UdpFace::connect(&config.forwarder).await {
        Ok(face) => face,
        Err(e) => {
            error!("could not create face: {e:#}");
            process::exit(-1);
        },
    };

    let pipeline = Arc::new(Pipeline::new(face, config.pipeline.window_size));
    pipeline.run();

    let mut runner =
        FileTransferRunner::new(cli.transfer_options(), Arc::clone(&pipeline));

    // Ctrl-C aborts the transfer; ending the pipeline flushes failure
    // sentinels so blocked workers wake promptly.
    {
        let stop = runner.stop_token();
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping transfer");
                stop.cancel();
                pipeline.end().await;
            }
        });
    }

    let result = async {
        runner.run().await?;
        runner.wait().await
    }
    .await;

    pipeline.end().await;

    let counters = pipeline.counters();
    info!(
        tx_interests = counters.tx_interests(),
        rx_data = counters.rx_data(),
        rx_nacks = counters.rx_nacks(),
        timeouts = counters.timeouts(),
        spurious_drops = counters.spurious_drops(),
        "pipeline totals"
    );

    if let Err(e) = result {
        error!("transfer failed: {e:#}");
        process::exit(1);
    }
}
