/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use thiserror::Error;

use crate::control::FtpReply;

#[derive(Debug, Error)]
pub enum FtpServerError {
    #[error("temporary server failure ({0})")]
    Temporary(FtpReply),
    #[error("permanent server failure ({0})")]
    Permanent(FtpReply),
    #[error("protocol failure ({0})")]
    Protocol(FtpReply),
}

impl FtpServerError {
    pub fn reply(&self) -> &FtpReply {
        match self {
            FtpServerError::Temporary(r) => r,
            FtpServerError::Permanent(r) => r,
            FtpServerError::Protocol(r) => r,
        }
    }
}
