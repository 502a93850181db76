/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::{FtpConnectionProvider, FtpDataListener};
use crate::control::FtpControlChannel;
use crate::error::{
    FtpAuthStatus, FtpCommandError, FtpConnectError, FtpDataTransferError, FtpFileRetrieveError,
    FtpSessionOpenError, FtpTransferSetupError,
};
use crate::transfer::{FtpBinaryDataTransfer, FtpDataSink, FtpTransferType};
use crate::{FtpClientConfig, log_msg};

#[derive(Debug, Clone)]
pub struct FtpRetrieveRequest<'a> {
    pub path: &'a str,
    pub resume: bool,
    pub chunk_size: Option<NonZeroUsize>,
}

impl<'a> FtpRetrieveRequest<'a> {
    pub fn new(path: &'a str) -> Self {
        FtpRetrieveRequest {
            path,
            resume: false,
            chunk_size: None,
        }
    }
}

pub struct FtpClient<CP, T, L, E, UD>
where
    CP: FtpConnectionProvider<T, L, E, UD>,
    T: AsyncRead + AsyncWrite + Unpin,
    L: FtpDataListener<T>,
    E: std::error::Error,
{
    config: Arc<FtpClientConfig>,
    control: FtpControlChannel<T>,
    conn_provider: CP,
    _phantom: PhantomData<(L, E, UD)>,
}

impl<CP, T, L, E, UD> FtpClient<CP, T, L, E, UD>
where
    CP: FtpConnectionProvider<T, L, E, UD>,
    T: AsyncRead + AsyncWrite + Unpin,
    L: FtpDataListener<T>,
    E: std::error::Error,
{
    pub async fn connect_to(
        upstream: &str,
        mut conn_provider: CP,
        user_data: &UD,
        config: &Arc<FtpClientConfig>,
    ) -> Result<Self, (FtpConnectError<E>, CP)> {
        let stream = match tokio::time::timeout(
            config.connect_timeout,
            conn_provider.new_control_connection(upstream, user_data),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err((FtpConnectError::ConnectIoError(e), conn_provider)),
            Err(_) => return Err((FtpConnectError::ConnectTimedOut, conn_provider)),
        };

        let mut control = FtpControlChannel::new(stream, config.control.clone());
        match tokio::time::timeout(config.greeting_timeout, control.wait_greetings()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err((FtpConnectError::GreetingFailed(e), conn_provider)),
            Err(_) => return Err((FtpConnectError::GreetingTimedOut, conn_provider)),
        }

        Ok(FtpClient {
            config: Arc::clone(config),
            control,
            conn_provider,
            _phantom: PhantomData,
        })
    }

    pub async fn new_user_session(
        &mut self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), FtpSessionOpenError> {
        match self.control.send_username(username).await? {
            FtpAuthStatus::LoggedIn => Ok(()),
            FtpAuthStatus::NeedAccount => Err(FtpSessionOpenError::AccountIsNeeded),
            FtpAuthStatus::NeedPassword => match self.control.send_password(password).await? {
                FtpAuthStatus::LoggedIn => Ok(()),
                FtpAuthStatus::NeedAccount => Err(FtpSessionOpenError::AccountIsNeeded),
                FtpAuthStatus::NeedPassword => Err(FtpSessionOpenError::AccountIsNeeded),
            },
        }
    }

    /// Retrieves `req.path` into `sink`. All bytes reach the sink before
    /// the call returns; the result itself carries no payload.
    ///
    /// The control channel is a single-owner resource: dropping the
    /// returned future mid-stream closes the data channel but leaves the
    /// control connection in an indeterminate state, so the session must
    /// be discarded afterwards.
    pub async fn retrieve_file<S>(
        &mut self,
        req: FtpRetrieveRequest<'_>,
        sink: &mut S,
        user_data: &UD,
    ) -> Result<(), FtpFileRetrieveError<E>>
    where
        S: FtpDataSink,
    {
        self.retrieve_file_with(req, sink, |_| {}, user_data).await
    }

    /// Same as [`retrieve_file`](Self::retrieve_file), with `on_chunk`
    /// invoked synchronously for every chunk, in order, after the chunk
    /// has been appended to the sink. With `req.chunk_size` set, every
    /// chunk except possibly the last has exactly that size.
    pub async fn retrieve_file_with<S, F>(
        &mut self,
        req: FtpRetrieveRequest<'_>,
        sink: &mut S,
        mut on_chunk: F,
        user_data: &UD,
    ) -> Result<(), FtpFileRetrieveError<E>>
    where
        S: FtpDataSink,
        F: FnMut(&[u8]),
    {
        self.control
            .request_transfer_type(FtpTransferType::Image)
            .await
            .map_err(FtpFileRetrieveError::TransferTypeFailed)?;

        if req.resume {
            let offset = sink
                .current_len()
                .await
                .map_err(FtpFileRetrieveError::SinkIoFailed)?;
            if offset > 0 {
                self.control
                    .request_restart(offset)
                    .await
                    .map_err(FtpFileRetrieveError::RestartFailed)?;
                log_msg!("transfer of {} will restart at offset {}", req.path, offset);
            }
        }

        let mut listener = self.setup_active_transfer(user_data).await?;

        self.control
            .start_retrieve(req.path)
            .await
            .map_err(FtpFileRetrieveError::StartFailed)?;

        let data_stream = match tokio::time::timeout(
            self.config.transfer.accept_timeout,
            listener.accept(),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(FtpTransferSetupError::AcceptFailed(e).into()),
            Err(_) => return Err(FtpTransferSetupError::AcceptTimedOut.into()),
        };
        // one data connection per transfer
        drop(listener);

        let transfer =
            FtpBinaryDataTransfer::new(data_stream, &self.config.transfer, req.chunk_size);
        let copied = transfer
            .read_to_end(sink, &mut on_chunk)
            .await
            .map_err(|e| match e {
                FtpDataTransferError::ReadFailed(e) => FtpFileRetrieveError::DataReadFailed(e),
                FtpDataTransferError::SinkIoFailed(e) => FtpFileRetrieveError::SinkIoFailed(e),
            })?;
        log_msg!("retrieved {} bytes for path {}", copied, req.path);

        match tokio::time::timeout(
            self.config.transfer.end_wait_timeout,
            self.control.wait_retrieve_end(),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FtpFileRetrieveError::EndReplyFailed(e)),
            Err(_) => Err(FtpFileRetrieveError::TimeoutToWaitEndReply),
        }
    }

    /// Opens the data listener and negotiates active mode, preferring
    /// EPRT and falling back to PORT once when the server rejects it.
    /// The listener closes on every failure path.
    async fn setup_active_transfer(
        &mut self,
        user_data: &UD,
    ) -> Result<L, FtpTransferSetupError<E>> {
        let listener = self
            .conn_provider
            .bind_data_listener(user_data)
            .await
            .map_err(FtpTransferSetupError::DataListenFailed)?;
        let local_addr = listener
            .local_addr()
            .map_err(FtpTransferSetupError::LocalAddrFailed)?;

        match self.control.request_active_eprt(local_addr).await {
            Ok(()) => Ok(listener),
            Err(e) if e.server_error().is_some() => match local_addr {
                SocketAddr::V4(v4) => {
                    log_msg!("EPRT rejected ({}), falling back to PORT", e);
                    self.control
                        .request_active_port(v4)
                        .await
                        .map_err(FtpTransferSetupError::CommandFailed)?;
                    Ok(listener)
                }
                // PORT cannot carry an IPv6 address
                SocketAddr::V6(_) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn quit_and_close(mut self) -> Result<(), FtpCommandError> {
        self.control.send_quit().await
    }
}
