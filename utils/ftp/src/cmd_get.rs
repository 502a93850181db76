/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use tern_ftp_client::{
    FtpClient, FtpConnectionProvider, FtpDataListener, FtpRetrieveRequest,
};

pub(super) const COMMAND: &str = "get";

const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_OUTPUT: &str = "output";
const COMMAND_ARG_RESUME: &str = "resume";
const COMMAND_ARG_CHUNK_SIZE: &str = "chunk-size";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Download a file in binary mode")
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("FILE PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_OUTPUT)
                .help("local output file")
                .num_args(1)
                .value_name("LOCAL PATH")
                .long("output")
                .short('o'),
        )
        .arg(
            Arg::new(COMMAND_ARG_RESUME)
                .help("resume a previously interrupted download")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("resume"),
        )
        .arg(
            Arg::new(COMMAND_ARG_CHUNK_SIZE)
                .help("deliver data in chunks of this many bytes")
                .num_args(1)
                .value_name("BYTES")
                .value_parser(value_parser!(NonZeroUsize))
                .long("chunk-size"),
        )
}

pub(super) async fn run<CP, S, L, E>(
    client: &mut FtpClient<CP, S, L, E, ()>,
    args: &ArgMatches,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S, L, E, ()>,
    S: AsyncRead + AsyncWrite + Unpin,
    L: FtpDataListener<S>,
    E: std::error::Error,
{
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .map(|s| s.as_str())
        .unwrap_or_default();
    let resume = args.get_flag(COMMAND_ARG_RESUME);

    let local_path = match args.get_one::<String>(COMMAND_ARG_OUTPUT) {
        Some(s) => PathBuf::from(s),
        None => {
            let name = path.rsplit('/').next().unwrap_or(path);
            if name.is_empty() {
                return Err(anyhow!("no local file name could be derived from {path}"));
            }
            PathBuf::from(name)
        }
    };

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .truncate(false)
        .open(&local_path)
        .await
        .context(format!("unable to open local file {}", local_path.display()))?;
    if !resume {
        file.set_len(0).await?;
    }

    let mut req = FtpRetrieveRequest::new(path);
    req.resume = resume;
    req.chunk_size = args.get_one::<NonZeroUsize>(COMMAND_ARG_CHUNK_SIZE).copied();

    client
        .retrieve_file(req, &mut file, &())
        .await
        .map_err(|e| anyhow!("retrieve failed: {e}"))?;
    file.flush().await?;

    let size = file.metadata().await?.len();
    println!("saved {} bytes to {}", size, local_path.display());
    Ok(())
}
