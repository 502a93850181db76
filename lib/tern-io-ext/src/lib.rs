/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

mod limited_buf_read_ext;
mod limited_read_until;

pub use limited_buf_read_ext::LimitedBufReadExt;
pub use limited_read_until::LimitedReadUntil;
