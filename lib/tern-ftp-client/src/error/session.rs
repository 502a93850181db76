/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use thiserror::Error;

use super::FtpCommandError;

pub(crate) enum FtpAuthStatus {
    LoggedIn,
    NeedPassword,
    NeedAccount,
}

#[derive(Debug, Error)]
pub enum FtpSessionOpenError {
    #[error("command failed: {0}")]
    CommandFailed(#[from] FtpCommandError),
    #[error("extra account is needed")]
    AccountIsNeeded,
}
