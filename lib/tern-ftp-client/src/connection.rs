/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::io;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

/// Listening half of an active-mode data channel. The advertised
/// address is sent to the server, which connects back to it.
#[async_trait]
pub trait FtpDataListener<T> {
    fn local_addr(&self) -> io::Result<SocketAddr>;
    async fn accept(&mut self) -> io::Result<T>;
}

#[async_trait]
impl FtpDataListener<TcpStream> for TcpListener {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }

    async fn accept(&mut self) -> io::Result<TcpStream> {
        let (stream, peer_addr) = TcpListener::accept(self).await?;
        crate::log_msg!("data connection accepted from {}", peer_addr);
        Ok(stream)
    }
}

#[async_trait]
pub trait FtpConnectionProvider<T, L, E, UD>
where
    T: AsyncRead + AsyncWrite,
    L: FtpDataListener<T>,
    E: std::error::Error,
{
    async fn new_control_connection(&mut self, upstream: &str, user_data: &UD) -> Result<T, E>;
    async fn bind_data_listener(&mut self, user_data: &UD) -> Result<L, E>;
}

/// Plain TCP connection provider. The data listener is bound on the
/// control connection's local address so the advertised host matches
/// the interface the server already talks to.
#[derive(Default)]
pub struct TcpConnectionProvider {
    bind_ip: Option<IpAddr>,
    local_addr: Option<SocketAddr>,
}

impl TcpConnectionProvider {
    pub fn set_bind_ip(&mut self, ip: IpAddr) {
        self.bind_ip = Some(ip);
    }
}

#[async_trait]
impl FtpConnectionProvider<TcpStream, TcpListener, io::Error, ()> for TcpConnectionProvider {
    async fn new_control_connection(
        &mut self,
        upstream: &str,
        _user_data: &(),
    ) -> io::Result<TcpStream> {
        let mut err = io::Error::new(io::ErrorKind::AddrNotAvailable, "no addr resolved");
        for addr in tokio::net::lookup_host(upstream).await? {
            if let Some(ip) = self.bind_ip {
                if ip.is_ipv4() != addr.is_ipv4() {
                    continue;
                }
            }
            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            if let Some(ip) = self.bind_ip {
                socket.bind(SocketAddr::new(ip, 0))?;
            }
            match socket.connect(addr).await {
                Ok(stream) => {
                    self.local_addr = stream.local_addr().ok();
                    return Ok(stream);
                }
                Err(e) => err = e,
            }
        }

        Err(err)
    }

    async fn bind_data_listener(&mut self, _user_data: &()) -> io::Result<TcpListener> {
        let ip = match self.bind_ip.or_else(|| self.local_addr.map(|a| a.ip())) {
            Some(ip) => ip,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    "no local address known for the data listener",
                ));
            }
        };
        TcpListener::bind(SocketAddr::new(ip, 0)).await
    }
}
