/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

mod debug;
pub use debug::{FTP_DEBUG_LOG_LEVEL, FTP_DEBUG_LOG_TARGET};

mod config;
pub use config::{FtpClientConfig, FtpControlConfig, FtpTransferConfig};

pub mod error;

mod connection;
pub use connection::{FtpConnectionProvider, FtpDataListener, TcpConnectionProvider};

mod control;
pub use control::{FtpCommand, FtpReply};

mod transfer;
pub use transfer::{FtpDataSink, FtpTransferType};

mod client;
pub use client::{FtpClient, FtpRetrieveRequest};
