/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::io;

use thiserror::Error;

use super::{FtpCommandError, FtpServerError, FtpTransferSetupError};

#[derive(Debug, Error)]
pub enum FtpFileRetrieveError<E: std::error::Error> {
    #[error("transfer type negotiation failed: {0}")]
    TransferTypeFailed(FtpCommandError),
    #[error("resume negotiation failed: {0}")]
    RestartFailed(FtpCommandError),
    #[error("data transfer setup error: {0}")]
    TransferSetupFailed(#[from] FtpTransferSetupError<E>),
    #[error("retrieve start failed: {0}")]
    StartFailed(FtpCommandError),
    #[error("data read failed: {0:?}")]
    DataReadFailed(io::Error),
    #[error("local sink io failed: {0:?}")]
    SinkIoFailed(io::Error),
    #[error("end reply error: {0}")]
    EndReplyFailed(FtpCommandError),
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
}

impl<E: std::error::Error> FtpFileRetrieveError<E> {
    pub fn server_error(&self) -> Option<&FtpServerError> {
        match self {
            FtpFileRetrieveError::TransferTypeFailed(e) => e.server_error(),
            FtpFileRetrieveError::RestartFailed(e) => e.server_error(),
            FtpFileRetrieveError::TransferSetupFailed(e) => e.server_error(),
            FtpFileRetrieveError::StartFailed(e) => e.server_error(),
            FtpFileRetrieveError::EndReplyFailed(e) => e.server_error(),
            _ => None,
        }
    }
}
