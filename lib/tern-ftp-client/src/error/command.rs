/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::io;

use thiserror::Error;

use super::{FtpReplyRecvError, FtpServerError};
use crate::control::FtpCommand;

#[derive(Debug, Error)]
pub enum FtpCommandError {
    #[error("unable to send command: {0:?}")]
    SendFailed(io::Error),
    #[error("unable to recv reply: {0}")]
    RecvFailed(#[from] FtpReplyRecvError),
    #[error("server rejected command: {0}")]
    ServerFailed(#[from] FtpServerError),
    #[error("unexpected reply code ({0} -> {1})")]
    UnexpectedReplyCode(FtpCommand, u16),
}

impl FtpCommandError {
    pub fn server_error(&self) -> Option<&FtpServerError> {
        match self {
            FtpCommandError::ServerFailed(e) => Some(e),
            _ => None,
        }
    }
}
