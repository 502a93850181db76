/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::net::{SocketAddr, SocketAddrV4};

use tokio::io::{AsyncRead, AsyncWrite, BufStream};

use crate::FtpControlConfig;
use crate::error::{FtpAuthStatus, FtpCommandError};
use crate::transfer::FtpTransferType;

mod response;
pub use response::FtpReply;

mod command;
pub use command::FtpCommand;

pub(crate) struct FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite,
{
    config: FtpControlConfig,
    stream: BufStream<T>,
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: T, config: FtpControlConfig) -> Self {
        FtpControlChannel {
            config,
            stream: BufStream::new(stream),
        }
    }

    pub(crate) async fn wait_greetings(&mut self) -> Result<(), FtpCommandError> {
        loop {
            let code = self.read_reply().await?.classify()?;
            return match code {
                120 => continue,
                220 => Ok(()),
                n => Err(FtpCommandError::UnexpectedReplyCode(
                    FtpCommand::GREETING,
                    n,
                )),
            };
        }
    }

    pub(crate) async fn send_username(
        &mut self,
        name: Option<&str>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::USER;
        self.send_cmd1(cmd, name.unwrap_or("anonymous"))
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let code = self.timed_read_reply("send username").await?.classify()?;
        match code {
            230 => Ok(FtpAuthStatus::LoggedIn),
            331 => Ok(FtpAuthStatus::NeedPassword),
            332 => Ok(FtpAuthStatus::NeedAccount),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_password(
        &mut self,
        pass: Option<&str>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::PASS;
        self.send_cmd1(cmd, pass.unwrap_or("xxx"))
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let code = self.timed_read_reply("send password").await?.classify()?;
        match code {
            202 | 230 => Ok(FtpAuthStatus::LoggedIn),
            332 => Ok(FtpAuthStatus::NeedAccount),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_quit(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::QUIT;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let code = self.timed_read_reply("send quit").await?.classify()?;
        match code {
            221 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_transfer_type(
        &mut self,
        t: FtpTransferType,
    ) -> Result<(), FtpCommandError> {
        let cmd = match t {
            FtpTransferType::Ascii => FtpCommand::TYPE_A,
            FtpTransferType::Image => FtpCommand::TYPE_I,
        };
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let code = self
            .timed_read_reply("request transfer type")
            .await?
            .classify()?;
        match code {
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_restart(&mut self, position: u64) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::REST;
        self.send_cmd1(cmd, &position.to_string())
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let code = self.timed_read_reply("request restart").await?.classify()?;
        match code {
            350 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_active_eprt(
        &mut self,
        local_addr: SocketAddr,
    ) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::EPRT;
        let proto = if local_addr.is_ipv4() { 1 } else { 2 };
        let param = format!("|{proto}|{}|{}|", local_addr.ip(), local_addr.port());
        self.send_cmd1(cmd, &param)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let code = self
            .timed_read_reply("request active eprt")
            .await?
            .classify()?;
        match code {
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_active_port(
        &mut self,
        local_addr: SocketAddrV4,
    ) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::PORT;
        let ip = local_addr.ip().octets();
        let port = local_addr.port();
        let param = format!(
            "{},{},{},{},{},{}",
            ip[0],
            ip[1],
            ip[2],
            ip[3],
            port >> 8,
            port & 0xff
        );
        self.send_cmd1(cmd, &param)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let code = self
            .timed_read_reply("request active port")
            .await?
            .classify()?;
        match code {
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn start_retrieve(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::RETR;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let code = self.timed_read_reply("start retrieve").await?.classify()?;
        match code {
            // preliminary replies mean the server is opening the data connection
            100..=199 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn wait_retrieve_end(&mut self) -> Result<(), FtpCommandError> {
        let code = self.read_reply().await?.classify()?;
        match code {
            226 | 250 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(FtpCommand::RETR, n)),
        }
    }
}
