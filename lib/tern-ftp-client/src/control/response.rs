/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};

use tern_io_ext::LimitedBufReadExt;

use super::FtpControlChannel;
use crate::error::{FtpReplyRecvError, FtpServerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpReply {
    SingleLine(u16, String),
    MultiLine(u16, Vec<String>),
    Unparseable(String),
}

macro_rules! char_to_u16 {
    ($c:expr) => {
        ($c - b'0') as u16
    };
}

fn parse_leading_code(line: &[u8]) -> Option<u16> {
    if line.len() < 4 {
        return None;
    }
    if !line[..3].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let code = char_to_u16!(line[0]) * 100 + char_to_u16!(line[1]) * 10 + char_to_u16!(line[2]);
    if !(100..600).contains(&code) {
        return None;
    }
    Some(code)
}

pub(super) enum FtpFirstLine {
    Complete(FtpReply),
    Partial(FtpMultiLineReplyParser),
}

impl FtpReply {
    fn unparseable_line(line: &[u8]) -> FtpReply {
        FtpReply::Unparseable(String::from_utf8_lossy(line).trim_end().to_string())
    }

    pub(super) fn parse_first_line(
        line: &[u8],
        max_lines: usize,
    ) -> Result<FtpFirstLine, FtpReplyRecvError> {
        let Some(code) = parse_leading_code(line) else {
            return Ok(FtpFirstLine::Complete(FtpReply::unparseable_line(line)));
        };
        match line[3] {
            b' ' => {
                let msg = std::str::from_utf8(&line[4..])
                    .map_err(|_| FtpReplyRecvError::LineIsNotUtf8)?;
                Ok(FtpFirstLine::Complete(FtpReply::SingleLine(
                    code,
                    msg.trim_end().to_string(),
                )))
            }
            b'-' => {
                let end_prefix = [line[0], line[1], line[2], b' '];
                let mut lines = Vec::<String>::with_capacity(max_lines);
                let msg = std::str::from_utf8(&line[4..])
                    .map_err(|_| FtpReplyRecvError::LineIsNotUtf8)?;
                lines.push(msg.trim_end().to_string());
                Ok(FtpFirstLine::Partial(FtpMultiLineReplyParser {
                    code,
                    end_prefix,
                    lines,
                }))
            }
            _ => Ok(FtpFirstLine::Complete(FtpReply::unparseable_line(line))),
        }
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            FtpReply::SingleLine(code, _) => Some(*code),
            FtpReply::MultiLine(code, _) => Some(*code),
            FtpReply::Unparseable(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FtpReply::SingleLine(_, line) => line.as_str(),
            FtpReply::MultiLine(_, lines) => lines.first().map(|s| s.as_str()).unwrap_or_default(),
            FtpReply::Unparseable(line) => line.as_str(),
        }
    }

    pub fn lines(&self) -> Option<&[String]> {
        match self {
            FtpReply::MultiLine(_, lines) => Some(lines),
            _ => None,
        }
    }

    /// Splits replies into the taxonomy shared by every command:
    /// 4xx temporary, 5xx permanent except 550, 550 and garbled text
    /// protocol. 1xx/2xx/3xx codes pass through for the per-command
    /// handler to judge.
    pub fn classify(self) -> Result<u16, FtpServerError> {
        match self.code() {
            Some(550) => Err(FtpServerError::Protocol(self)),
            Some(400..=499) => Err(FtpServerError::Temporary(self)),
            Some(500..=599) => Err(FtpServerError::Permanent(self)),
            Some(code) => Ok(code),
            None => Err(FtpServerError::Protocol(self)),
        }
    }
}

impl fmt::Display for FtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpReply::SingleLine(code, line) => write!(f, "{code} {line}"),
            FtpReply::MultiLine(code, lines) => {
                write!(
                    f,
                    "{code} {}",
                    lines.first().map(|s| s.as_str()).unwrap_or_default()
                )
            }
            FtpReply::Unparseable(line) => f.write_str(line),
        }
    }
}

pub(super) struct FtpMultiLineReplyParser {
    code: u16,
    end_prefix: [u8; 4],
    lines: Vec<String>,
}

impl FtpMultiLineReplyParser {
    pub(super) fn feed_line(&mut self, line: &[u8]) -> Result<bool, FtpReplyRecvError> {
        if line.starts_with(&self.end_prefix) {
            let msg =
                std::str::from_utf8(&line[4..]).map_err(|_| FtpReplyRecvError::LineIsNotUtf8)?;
            self.lines.push(msg.trim_end().to_string());
            Ok(true)
        } else {
            let msg = std::str::from_utf8(line).map_err(|_| FtpReplyRecvError::LineIsNotUtf8)?;
            // do not trim whitespace at beginning
            self.lines.push(msg.trim_end().to_string());
            Ok(false)
        }
    }

    pub(super) fn finish(self) -> FtpReply {
        FtpReply::MultiLine(self.code, self.lines)
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<(), FtpReplyRecvError> {
        buf.clear();

        let (found, len) = self
            .stream
            .limited_read_until(b'\n', self.config.max_line_len, buf)
            .await
            .map_err(FtpReplyRecvError::ReadFailed)?;

        if len == 0 {
            return Err(FtpReplyRecvError::ConnectionClosed);
        }

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(String::from_utf8_lossy(buf).trim_end());

        if !found {
            return Err(FtpReplyRecvError::LineTooLong);
        }
        Ok(())
    }

    pub(super) async fn read_reply(&mut self) -> Result<FtpReply, FtpReplyRecvError> {
        let mut buf = Vec::<u8>::with_capacity(self.config.max_line_len);
        self.read_line(&mut buf).await?;

        match FtpReply::parse_first_line(&buf, self.config.max_multi_lines)? {
            FtpFirstLine::Complete(reply) => Ok(reply),
            FtpFirstLine::Partial(mut ml_parser) => {
                for _i in 0..self.config.max_multi_lines {
                    self.read_line(&mut buf).await?;
                    if ml_parser.feed_line(&buf)? {
                        return Ok(ml_parser.finish());
                    }
                }
                Err(FtpReplyRecvError::TooManyLines)
            }
        }
    }

    pub(super) async fn timed_read_reply(
        &mut self,
        stage: &'static str,
    ) -> Result<FtpReply, FtpReplyRecvError> {
        match tokio::time::timeout(self.config.command_timeout, self.read_reply()).await {
            Ok(r) => r,
            Err(_) => Err(FtpReplyRecvError::ReadResponseTimedOut(stage)),
        }
    }
}
