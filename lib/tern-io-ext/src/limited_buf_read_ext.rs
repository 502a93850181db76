/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use tokio::io::AsyncBufRead;

use super::limited_read_until::LimitedReadUntil;

pub trait LimitedBufReadExt: AsyncBufRead {
    fn limited_read_until<'a>(
        &'a mut self,
        delimiter: u8,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> LimitedReadUntil<'a, Self>
    where
        Self: Unpin,
    {
        LimitedReadUntil::new(self, delimiter, max_len, buf)
    }
}

impl<R: AsyncBufRead + ?Sized> LimitedBufReadExt for R {}
