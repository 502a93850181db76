/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::io;

use thiserror::Error;

use super::{FtpCommandError, FtpServerError};

#[derive(Debug, Error)]
pub enum FtpTransferSetupError<E: std::error::Error> {
    #[error("unable to bind data listener: {0:?}")]
    DataListenFailed(E),
    #[error("no usable data listener address: {0:?}")]
    LocalAddrFailed(io::Error),
    #[error("active mode rejected: {0}")]
    CommandFailed(#[from] FtpCommandError),
    #[error("data connection accept failed: {0:?}")]
    AcceptFailed(io::Error),
    #[error("timed out to accept data connection")]
    AcceptTimedOut,
}

impl<E: std::error::Error> FtpTransferSetupError<E> {
    pub fn server_error(&self) -> Option<&FtpServerError> {
        match self {
            FtpTransferSetupError::CommandFailed(e) => e.server_error(),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum FtpDataTransferError {
    #[error("data read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("local sink io failed: {0:?}")]
    SinkIoFailed(io::Error),
}
