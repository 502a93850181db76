/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::net::IpAddr;

use anyhow::anyhow;
use clap::{Arg, ArgAction, Command, value_parser};

use tern_ftp_client::{FtpClient, FtpClientConfig, TcpConnectionProvider};

mod logger;

mod cmd_get;

const GLOBAL_ARG_SERVER: &str = "server";
const GLOBAL_ARG_USERNAME: &str = "username";
const GLOBAL_ARG_PASSWORD: &str = "password";
const GLOBAL_ARG_SOURCE_IP: &str = "source-ip";
const GLOBAL_ARG_VERBOSE: &str = "verbose";

fn build_cli_args() -> Command {
    Command::new("tern-ftp")
        .arg(
            Arg::new(GLOBAL_ARG_SERVER)
                .help("FTP server address")
                .num_args(1)
                .value_name("SERVER ADDRESS")
                .required(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USERNAME)
                .help("FTP username")
                .num_args(1)
                .value_name("USERNAME")
                .short('u')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_PASSWORD)
                .help("FTP password")
                .num_args(1)
                .value_name("PASSWORD")
                .short('p')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SOURCE_IP)
                .help("source ip address")
                .num_args(1)
                .value_name("IP ADDRESS")
                .value_parser(value_parser!(IpAddr))
                .long("source")
                .short('s')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_VERBOSE)
                .help("show verbose message")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .global(true),
        )
        .subcommand(cmd_get::command())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    let verbose_level = args
        .get_one::<u8>(GLOBAL_ARG_VERBOSE)
        .copied()
        .unwrap_or_default();
    let logger = logger::SyncLogger::new(verbose_level);
    logger.into_global_logger().unwrap();

    let mut server = args.get_one::<String>(GLOBAL_ARG_SERVER).unwrap().clone();
    if !server.contains(':') {
        server.push_str(":21");
    }

    let username = args.get_one::<String>(GLOBAL_ARG_USERNAME);
    let password = args.get_one::<String>(GLOBAL_ARG_PASSWORD);

    let mut conn_provider = TcpConnectionProvider::default();
    if let Some(ip) = args.get_one::<IpAddr>(GLOBAL_ARG_SOURCE_IP) {
        conn_provider.set_bind_ip(*ip);
    }

    let config = std::sync::Arc::new(FtpClientConfig::default());

    if let Some((subcommand, args)) = args.subcommand() {
        let mut client =
            match FtpClient::connect_to(&server, conn_provider, &(), &config).await {
                Ok(client) => client,
                Err((e, _)) => return Err(e.into()),
            };
        client
            .new_user_session(username.map(|s| s.as_str()), password.map(|s| s.as_str()))
            .await?;

        let ret = match subcommand {
            cmd_get::COMMAND => cmd_get::run(&mut client, args).await,
            cmd => Err(anyhow!("invalid subcommand {cmd}")),
        };

        client.quit_and_close().await?;

        ret
    } else {
        Err(anyhow!("no subcommand found"))
    }
}
