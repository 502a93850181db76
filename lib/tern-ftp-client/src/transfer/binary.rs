/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::num::NonZeroUsize;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::FtpDataSink;
use crate::FtpTransferConfig;
use crate::error::FtpDataTransferError;

pub(crate) struct FtpBinaryDataTransfer<T> {
    io: T,
    chunk_buf: Vec<u8>,
    fixed_chunk: bool,
}

impl<T> FtpBinaryDataTransfer<T>
where
    T: AsyncRead + Unpin,
{
    pub(crate) fn new(io: T, config: &FtpTransferConfig, chunk_size: Option<NonZeroUsize>) -> Self {
        let (capacity, fixed_chunk) = match chunk_size {
            Some(n) => (n.get(), true),
            None => (config.buffer_size, false),
        };
        FtpBinaryDataTransfer {
            io,
            chunk_buf: vec![0u8; capacity],
            fixed_chunk,
        }
    }

    async fn fill_chunk(&mut self) -> Result<usize, FtpDataTransferError> {
        let mut filled = 0;
        while filled < self.chunk_buf.len() {
            let n = self
                .io
                .read(&mut self.chunk_buf[filled..])
                .await
                .map_err(FtpDataTransferError::ReadFailed)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    pub(crate) async fn read_to_end<S, F>(
        mut self,
        sink: &mut S,
        on_chunk: &mut F,
    ) -> Result<u64, FtpDataTransferError>
    where
        S: FtpDataSink,
        F: FnMut(&[u8]),
    {
        let mut total: u64 = 0;
        loop {
            let filled = if self.fixed_chunk {
                self.fill_chunk().await?
            } else {
                self.io
                    .read(&mut self.chunk_buf)
                    .await
                    .map_err(FtpDataTransferError::ReadFailed)?
            };
            if filled == 0 {
                return Ok(total);
            }

            sink.append(&self.chunk_buf[..filled])
                .await
                .map_err(FtpDataTransferError::SinkIoFailed)?;
            on_chunk(&self.chunk_buf[..filled]);
            total += filled as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &[u8] = b"This is the content\nof the file named 'test'.\n";

    async fn run_transfer(chunk_size: Option<usize>) -> (Vec<u8>, Vec<Vec<u8>>) {
        let mut sink = Vec::new();
        let mut chunks = Vec::new();
        let transfer = FtpBinaryDataTransfer::new(
            CONTENT,
            &FtpTransferConfig::default(),
            chunk_size.and_then(NonZeroUsize::new),
        );
        let total = transfer
            .read_to_end(&mut sink, &mut |chunk: &[u8]| chunks.push(chunk.to_vec()))
            .await
            .unwrap();
        assert_eq!(total, CONTENT.len() as u64);
        (sink, chunks)
    }

    #[tokio::test]
    async fn free_running_reads_reach_sink() {
        let (sink, chunks) = run_transfer(None).await;
        assert_eq!(sink, CONTENT);
        let gathered: Vec<u8> = chunks.concat();
        assert_eq!(gathered, CONTENT);
    }

    #[tokio::test]
    async fn fixed_chunk_sequence() {
        let (sink, chunks) = run_transfer(Some(10)).await;
        assert_eq!(sink, CONTENT);
        assert_eq!(
            chunks,
            vec![
                b"This is th".to_vec(),
                b"e content\n".to_vec(),
                b"of the fil".to_vec(),
                b"e named 't".to_vec(),
                b"est'.\n".to_vec(),
            ]
        );
    }

    #[tokio::test]
    async fn fixed_chunk_count_and_sizes() {
        let chunk = 10usize;
        let (_, chunks) = run_transfer(Some(chunk)).await;
        assert_eq!(chunks.len(), CONTENT.len().div_ceil(chunk));
        for c in &chunks[..chunks.len() - 1] {
            assert_eq!(c.len(), chunk);
        }
        assert!(chunks.last().unwrap().len() <= chunk);
    }

    #[tokio::test]
    async fn chunk_size_equal_to_content() {
        let (sink, chunks) = run_transfer(Some(CONTENT.len())).await;
        assert_eq!(sink, CONTENT);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), CONTENT.len());
    }

    #[tokio::test]
    async fn empty_stream() {
        let mut sink = Vec::new();
        let transfer = FtpBinaryDataTransfer::new(
            &b""[..],
            &FtpTransferConfig::default(),
            NonZeroUsize::new(10),
        );
        let total = transfer
            .read_to_end(&mut sink, &mut |_: &[u8]| panic!("no chunks expected"))
            .await
            .unwrap();
        assert_eq!(total, 0);
        assert!(sink.is_empty());
    }
}
