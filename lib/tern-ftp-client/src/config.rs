/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::time::Duration;

const DEFAULT_MAX_LINE_LEN: usize = 2048;
const DEFAULT_MAX_MULTI_LINES: usize = 64;
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;
const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_END_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_GREETING_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FtpControlConfig {
    pub max_line_len: usize,
    pub max_multi_lines: usize,
    pub command_timeout: Duration,
}

impl Default for FtpControlConfig {
    fn default() -> Self {
        FtpControlConfig {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_multi_lines: DEFAULT_MAX_MULTI_LINES,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FtpTransferConfig {
    pub buffer_size: usize,
    pub accept_timeout: Duration,
    pub end_wait_timeout: Duration,
}

impl Default for FtpTransferConfig {
    fn default() -> Self {
        FtpTransferConfig {
            buffer_size: DEFAULT_BUFFER_SIZE,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            end_wait_timeout: DEFAULT_END_WAIT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FtpClientConfig {
    pub control: FtpControlConfig,
    pub transfer: FtpTransferConfig,
    pub connect_timeout: Duration,
    pub greeting_timeout: Duration,
}

impl Default for FtpClientConfig {
    fn default() -> Self {
        FtpClientConfig {
            control: FtpControlConfig::default(),
            transfer: FtpTransferConfig::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            greeting_timeout: DEFAULT_GREETING_TIMEOUT,
        }
    }
}
