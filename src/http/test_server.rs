//! Minimal in-process HTTP/1.1 server with canned responses.
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};

const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy)]
pub(crate) enum Responder {
    AlwaysOk,
    /// 200, 500, 200, 500, ... across all connections.
    Alternating,
    Fixed(u16),
}

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub(crate) head: String,
    pub(crate) body: Vec<u8>,
}

struct ServerState {
    responder: Responder,
    served: AtomicU64,
    requests: Mutex<Vec<CapturedRequest>>,
}

impl ServerState {
    fn next_status(&self) -> u16 {
        let index = self.served.fetch_add(1, Ordering::AcqRel);
        match self.responder {
            Responder::AlwaysOk => 200,
            Responder::Alternating => {
                if index % 2 == 0 {
                    200
                } else {
                    500
                }
            }
            Responder::Fixed(status) => status,
        }
    }
}

pub(crate) struct TestServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub(crate) async fn start(responder: Responder) -> AppResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState {
            responder,
            served: AtomicU64::new(0),
            requests: Mutex::new(Vec::new()),
        });
        let accept_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _peer)) = listener.accept().await {
                let state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    drop(serve_connection(stream, state).await);
                });
            }
        });
        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    pub(crate) fn url(&self, path: &str) -> AppResult<Url> {
        Url::parse(&format!("http://{}{}", self.addr, path))
            .map_err(|err| AppError::validation(format!("Bad test URL: {}", err)))
    }

    pub(crate) fn requests(&self) -> Vec<CapturedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_connection(mut stream: TcpStream, state: Arc<ServerState>) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    while let Some(request) = read_request(&mut stream, &mut buffer).await? {
        let status = state.next_status();
        state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let body = if (200..300).contains(&status) {
            "ok".to_owned()
        } else {
            format!("upstream failure {}\n", status)
        };
        let response = format!(
            "HTTP/1.1 {} Canned\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
    }
    Ok(())
}

async fn read_request(
    stream: &mut TcpStream,
    buffer: &mut Vec<u8>,
) -> std::io::Result<Option<CapturedRequest>> {
    loop {
        if let Some(end) = buffer
            .windows(HEADER_END.len())
            .position(|window| window == HEADER_END)
        {
            let head = String::from_utf8_lossy(buffer.get(..end).unwrap_or_default()).into_owned();
            let body_start = end.saturating_add(HEADER_END.len());
            let body_end = body_start.saturating_add(content_length(&head));
            if buffer.len() >= body_end {
                let body = buffer.get(body_start..body_end).unwrap_or_default().to_vec();
                buffer.drain(..body_end);
                return Ok(Some(CapturedRequest { head, body }));
            }
        }
        let mut chunk = [0_u8; 4096];
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(None);
        }
        buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
