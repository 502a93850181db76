/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

mod sink;
pub use sink::FtpDataSink;

mod binary;
pub(crate) use binary::FtpBinaryDataTransfer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpTransferType {
    Ascii,
    Image,
}
