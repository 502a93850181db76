/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::io;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Local destination for retrieved bytes. `current_len` is queried once
/// before a resumed transfer; `append` receives every chunk in order.
#[async_trait]
pub trait FtpDataSink: Send {
    async fn append(&mut self, chunk: &[u8]) -> io::Result<()>;
    async fn current_len(&mut self) -> io::Result<u64>;
}

#[async_trait]
impl FtpDataSink for Vec<u8> {
    async fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.extend_from_slice(chunk);
        Ok(())
    }

    async fn current_len(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}

/// The file should be opened in append mode when resuming.
#[async_trait]
impl FtpDataSink for tokio::fs::File {
    async fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.write_all(chunk).await
    }

    async fn current_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata().await?.len())
    }
}
