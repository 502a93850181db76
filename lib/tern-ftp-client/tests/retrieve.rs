/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 Tern Project
 */

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use tern_ftp_client::error::{FtpFileRetrieveError, FtpServerError};
use tern_ftp_client::{FtpClient, FtpClientConfig, FtpRetrieveRequest, TcpConnectionProvider};

const CONTENT: &[u8] = b"This is the content\nof the file named 'test'.\n";

type TestClient = FtpClient<TcpConnectionProvider, TcpStream, TcpListener, io::Error, ()>;
type RetrieveError = FtpFileRetrieveError<io::Error>;

/// Scripted control peer: default behavior is a well-behaved server for
/// a single session; any command verb present in `overrides` answers
/// with the scripted line instead of performing its normal action.
struct DummyFtpServer {
    overrides: HashMap<&'static str, &'static str>,
}

impl DummyFtpServer {
    fn new(overrides: &[(&'static str, &'static str)]) -> Self {
        DummyFtpServer {
            overrides: overrides.iter().copied().collect(),
        }
    }

    async fn spawn(self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                let _ = self.serve(stream).await;
            }
        });
        addr
    }

    async fn serve(&self, stream: TcpStream) -> io::Result<()> {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        write_half
            .write_all(b"220 Dummy FTP server ready.\r\n")
            .await?;

        let mut data_addr: Option<SocketAddr> = None;
        let mut offset: usize = 0;
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let line = line.trim_end();
            let (verb, param) = match line.split_once(' ') {
                Some((verb, param)) => (verb, param),
                None => (line, ""),
            };

            if let Some(reply) = self.overrides.get(verb) {
                write_half.write_all(reply.as_bytes()).await?;
                write_half.write_all(b"\r\n").await?;
                continue;
            }

            match verb {
                "USER" => {
                    write_half
                        .write_all(b"331 User name okay, need password.\r\n")
                        .await?;
                }
                "PASS" => {
                    write_half.write_all(b"230 User logged in.\r\n").await?;
                }
                "TYPE" => {
                    write_half.write_all(b"200 Type set to I.\r\n").await?;
                }
                "EPRT" => {
                    data_addr = parse_eprt(param);
                    write_half
                        .write_all(b"200 EPRT command successful.\r\n")
                        .await?;
                }
                "PORT" => {
                    data_addr = parse_port(param);
                    write_half
                        .write_all(b"200 PORT command successful.\r\n")
                        .await?;
                }
                "REST" => {
                    offset = param.parse().unwrap_or(0);
                    let reply = format!("350 Restarting at {offset}.\r\n");
                    write_half.write_all(reply.as_bytes()).await?;
                }
                "RETR" => {
                    write_half
                        .write_all(b"150 Opening BINARY mode data connection.\r\n")
                        .await?;
                    let addr = data_addr.expect("no data port negotiated");
                    let mut data_stream = TcpStream::connect(addr).await?;
                    data_stream.write_all(&CONTENT[offset..]).await?;
                    data_stream.shutdown().await?;
                    drop(data_stream);
                    write_half
                        .write_all(b"226 Closing data connection. (RETR test)\r\n")
                        .await?;
                    offset = 0;
                }
                "QUIT" => {
                    write_half.write_all(b"221 Goodbye.\r\n").await?;
                    return Ok(());
                }
                _ => {
                    write_half
                        .write_all(b"500 Syntax error, command unrecognized.\r\n")
                        .await?;
                }
            }
        }
    }
}

fn parse_eprt(param: &str) -> Option<SocketAddr> {
    let mut parts = param.split('|');
    parts.next()?;
    let _proto = parts.next()?;
    let ip = parts.next()?;
    let port = parts.next()?;
    format!("{ip}:{port}").parse().ok()
}

fn parse_port(param: &str) -> Option<SocketAddr> {
    let fields: Vec<u16> = param.split(',').filter_map(|s| s.parse().ok()).collect();
    if fields.len() != 6 {
        return None;
    }
    let addr = format!(
        "{}.{}.{}.{}:{}",
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        (fields[4] << 8) + fields[5]
    );
    addr.parse().ok()
}

async fn connect_client(addr: SocketAddr) -> TestClient {
    let config = Arc::new(FtpClientConfig::default());
    let mut client = match FtpClient::connect_to(
        &addr.to_string(),
        TcpConnectionProvider::default(),
        &(),
        &config,
    )
    .await
    {
        Ok(client) => client,
        Err((e, _)) => panic!("connect failed: {e}"),
    };
    client
        .new_user_session(Some("user"), Some("pass"))
        .await
        .unwrap();
    client
}

async fn retrieve_with_overrides(
    overrides: &[(&'static str, &'static str)],
    resume: bool,
    prefill: &[u8],
) -> Result<Vec<u8>, RetrieveError> {
    let addr = DummyFtpServer::new(overrides).spawn().await;
    let mut client = connect_client(addr).await;
    let mut sink: Vec<u8> = prefill.to_vec();

    let mut req = FtpRetrieveRequest::new("test");
    req.resume = resume;
    client.retrieve_file(req, &mut sink, &()).await?;
    Ok(sink)
}

#[tokio::test]
async fn retrieve_saves_content() {
    let sink = retrieve_with_overrides(&[], false, b"").await.unwrap();
    assert_eq!(sink, CONTENT);
}

#[tokio::test]
async fn retrieve_then_quit() {
    let addr = DummyFtpServer::new(&[]).spawn().await;
    let mut client = connect_client(addr).await;
    let mut sink: Vec<u8> = Vec::new();

    client
        .retrieve_file(FtpRetrieveRequest::new("test"), &mut sink, &())
        .await
        .unwrap();
    assert_eq!(sink, CONTENT);

    client.quit_and_close().await.unwrap();
}

#[tokio::test]
async fn retrieve_yields_chunks_of_requested_size() {
    let addr = DummyFtpServer::new(&[]).spawn().await;
    let mut client = connect_client(addr).await;
    let mut sink: Vec<u8> = Vec::new();
    let mut chunks: Vec<Vec<u8>> = Vec::new();

    let mut req = FtpRetrieveRequest::new("test");
    req.chunk_size = NonZeroUsize::new(10);
    client
        .retrieve_file_with(req, &mut sink, |chunk| chunks.push(chunk.to_vec()), &())
        .await
        .unwrap();

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
    assert_eq!(sink, CONTENT);
    assert_eq!(chunks.concat(), sink);
    assert_eq!(chunks.len(), CONTENT.len().div_ceil(10));
}

#[tokio::test]
async fn resume_appends_remaining_content() {
    let sink = retrieve_with_overrides(&[], true, b"This is the content\n")
        .await
        .unwrap();
    assert_eq!(sink, CONTENT);
}

#[tokio::test]
async fn resume_with_empty_sink_sends_no_rest() {
    // a scripted REST failure proves the command is never issued
    let sink = retrieve_with_overrides(
        &[("REST", "502 Command not implemented.")],
        true,
        b"",
    )
    .await
    .unwrap();
    assert_eq!(sink, CONTENT);
}

#[tokio::test]
async fn rest_failures_are_classified() {
    let cases: &[(&'static str, fn(&FtpServerError) -> bool)] = &[
        ("Requested action not taken.", |e| {
            matches!(e, FtpServerError::Protocol(_))
        }),
        ("500 Syntax error, command unrecognized.", |e| {
            matches!(e, FtpServerError::Permanent(_))
        }),
        ("501 Syntax error in parameters or arguments.", |e| {
            matches!(e, FtpServerError::Permanent(_))
        }),
        ("502 Command not implemented.", |e| {
            matches!(e, FtpServerError::Permanent(_))
        }),
        ("421 Service not available, closing control connection.", |e| {
            matches!(e, FtpServerError::Temporary(_))
        }),
        ("530 Not logged in.", |e| {
            matches!(e, FtpServerError::Permanent(_))
        }),
    ];

    for (reply, expected) in cases.iter().copied() {
        let err = retrieve_with_overrides(&[("REST", reply)], true, b"This is the content\n")
            .await
            .unwrap_err();
        assert!(
            matches!(err, FtpFileRetrieveError::RestartFailed(_)),
            "reply {reply:?} produced {err:?}"
        );
        let server_err = err.server_error().expect("expected a classified error");
        assert!(expected(server_err), "reply {reply:?} produced {server_err:?}");
    }
}

#[tokio::test]
async fn retr_failures_are_classified() {
    let cases: &[(&'static str, fn(&FtpServerError) -> bool)] = &[
        ("450 Requested file action not taken.", |e| {
            matches!(e, FtpServerError::Temporary(_))
        }),
        ("Requested action not taken.", |e| {
            matches!(e, FtpServerError::Protocol(_))
        }),
        ("550 Requested action not taken.", |e| {
            matches!(e, FtpServerError::Protocol(_))
        }),
        ("500 Syntax error, command unrecognized.", |e| {
            matches!(e, FtpServerError::Permanent(_))
        }),
        ("501 Syntax error in parameters or arguments.", |e| {
            matches!(e, FtpServerError::Permanent(_))
        }),
        ("421 Service not available, closing control connection.", |e| {
            matches!(e, FtpServerError::Temporary(_))
        }),
        ("530 Not logged in.", |e| {
            matches!(e, FtpServerError::Permanent(_))
        }),
    ];

    for (reply, expected) in cases.iter().copied() {
        let err = retrieve_with_overrides(&[("RETR", reply)], false, b"")
            .await
            .unwrap_err();
        assert!(
            matches!(err, FtpFileRetrieveError::StartFailed(_)),
            "reply {reply:?} produced {err:?}"
        );
        let server_err = err.server_error().expect("expected a classified error");
        assert!(expected(server_err), "reply {reply:?} produced {server_err:?}");
    }
}

#[tokio::test]
async fn eprt_rejection_falls_back_to_port() {
    let sink = retrieve_with_overrides(
        &[("EPRT", "500 Syntax error, command unrecognized.")],
        false,
        b"",
    )
    .await
    .unwrap();
    assert_eq!(sink, CONTENT);
}

#[tokio::test]
async fn data_port_failures_report_legacy_attempt() {
    let cases: &[(&'static str, &'static str, fn(&FtpServerError) -> bool)] = &[
        (
            "500 Syntax error, command unrecognized.",
            "500 Syntax error, command unrecognized.",
            |e| matches!(e, FtpServerError::Permanent(_)),
        ),
        (
            "501 Syntax error in parameters or arguments.",
            "501 Syntax error in parameters or arguments.",
            |e| matches!(e, FtpServerError::Permanent(_)),
        ),
        (
            "421 Service not available, closing control connection.",
            "421 Service not available, closing control connection.",
            |e| matches!(e, FtpServerError::Temporary(_)),
        ),
        (
            "530 Not logged in.",
            "530 Not logged in.",
            |e| matches!(e, FtpServerError::Permanent(_)),
        ),
        // the legacy attempt's classification wins over the modern one
        (
            "500 Syntax error, command unrecognized.",
            "421 Service not available, closing control connection.",
            |e| matches!(e, FtpServerError::Temporary(_)),
        ),
    ];

    for (eprt_reply, port_reply, expected) in cases.iter().copied() {
        let err = retrieve_with_overrides(
            &[("EPRT", eprt_reply), ("PORT", port_reply)],
            false,
            b"",
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, FtpFileRetrieveError::TransferSetupFailed(_)),
            "replies ({eprt_reply:?}, {port_reply:?}) produced {err:?}"
        );
        let server_err = err.server_error().expect("expected a classified error");
        assert!(
            expected(server_err),
            "replies ({eprt_reply:?}, {port_reply:?}) produced {server_err:?}"
        );
    }
}

#[tokio::test]
async fn failed_retrieve_keeps_partial_sink() {
    let addr = DummyFtpServer::new(&[("RETR", "550 Requested action not taken.")])
        .spawn()
        .await;
    let mut client = connect_client(addr).await;
    let mut sink: Vec<u8> = b"This is the content\n".to_vec();
    let mut req = FtpRetrieveRequest::new("test");
    req.resume = true;
    let err = client.retrieve_file(req, &mut sink, &()).await.unwrap_err();
    assert!(matches!(err, FtpFileRetrieveError::StartFailed(_)));
    assert_eq!(sink, b"This is the content\n");
}

#[tokio::test]
async fn retrieve_into_file_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download.bin");
    std::fs::write(&path, b"This is the content\n").unwrap();

    let addr = DummyFtpServer::new(&[]).spawn().await;
    let mut client = connect_client(addr).await;

    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .await
        .unwrap();
    let mut req = FtpRetrieveRequest::new("test");
    req.resume = true;
    client.retrieve_file(req, &mut file, &()).await.unwrap();
    file.flush().await.unwrap();
    drop(file);

    assert_eq!(std::fs::read(&path).unwrap(), CONTENT);
}
