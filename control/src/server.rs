// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The control socket's accept loop.
//!
//! One [`mio::Poll`] instance multiplexes the listening socket and every
//! accepted connection on a single thread; each connection reassembles
//! [`wire::Request`] frames from a growing read buffer and answers them
//! in place. This mirrors the `cpi` event loop's poll-then-drain-ctl-
//! channel structure, just over a stream socket instead of a datagram
//! one, and over [`crossbeam_channel`] instead of a tokio channel, since
//! nothing else in this binary runs a tokio reactor.

use std::collections::HashMap;
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::net::UnixListener as StdUnixListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::{Buf, BufMut, BytesMut};
use mio::net::{UnixListener, UnixStream};
use mio::{Events, Interest, Poll, Token};
use routing::ControlBridge;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::ops;
use crate::wire::{HEADER_LEN, Request, RequestHeader, ResponseHeader, WireError};

/// Default path of the control socket, matching the path a `grout` client
/// expects if not told otherwise.
pub const DEFAULT_SOCK_PATH: &str = "/run/grout.sock";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Filesystem path of the `AF_UNIX` stream socket to bind and listen
    /// on. Any existing file at this path is removed first.
    pub sock_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            sock_path: DEFAULT_SOCK_PATH.to_string(),
        }
    }
}

/// The control server failed to start.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The socket path could not be bound or made nonblocking.
    #[error("binding control socket at {path}: {source}")]
    Bind {
        /// The path that failed to bind.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The mio poller could not be created or registered.
    #[error("setting up control socket poller: {0}")]
    Poll(#[source] io::Error),
    /// The server thread could not be spawned.
    #[error("spawning control server thread: {0}")]
    Spawn(#[source] io::Error),
}

/// A message sent to the running server over its control channel.
enum CtlMsg {
    Shutdown,
}

/// A handle to a running control server.
pub struct ServerHandle {
    ctl: crossbeam_channel::Sender<CtlMsg>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Ask the server to stop and wait for its thread to exit.
    ///
    /// # Panics
    /// Panics if the server thread itself panicked.
    #[allow(clippy::expect_used)] // propagating the thread's own panic is the point
    pub fn shutdown(&mut self) {
        let _ = self.ctl.send(CtlMsg::Shutdown);
        if let Some(handle) = self.thread.take() {
            handle.join().expect("control server thread panicked");
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}

const LISTENER: Token = Token(0);

struct Connection {
    stream: UnixStream,
    in_buf: BytesMut,
    out_buf: BytesMut,
}

impl Connection {
    fn new(stream: UnixStream) -> Self {
        Self {
            stream,
            in_buf: BytesMut::with_capacity(HEADER_LEN),
            out_buf: BytesMut::new(),
        }
    }

    /// Pull as much as is available off the socket into `in_buf`, then
    /// answer every complete request frame it now contains.
    ///
    /// Returns `Ok(false)` once the peer has closed its write side and
    /// every buffered byte has been consumed.
    fn readable(&mut self, bridge: &ControlBridge) -> io::Result<bool> {
        let mut chunk = [0_u8; 4096];
        let mut peer_closed = false;
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    peer_closed = true;
                    break;
                }
                Ok(n) => self.in_buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.drain_requests(bridge)?;
        Ok(!peer_closed)
    }

    /// Decode and answer every full frame currently sitting in `in_buf`,
    /// leaving a trailing partial frame, if any, for the next read.
    fn drain_requests(&mut self, bridge: &ControlBridge) -> io::Result<()> {
        loop {
            let mut peek = &self.in_buf[..];
            let header = match RequestHeader::decode(&mut peek) {
                Ok(header) => header,
                Err(WireError::TruncatedHeader(_)) => break,
                Err(e) => {
                    warn!("rejecting control connection: {e}");
                    return Err(io::Error::new(ErrorKind::InvalidData, e.to_string()));
                }
            };
            #[allow(clippy::cast_possible_truncation)] // usize is at least 32 bits on every supported target
            let payload_len = header.payload_len as usize;
            if self.in_buf.len() < HEADER_LEN + payload_len {
                break;
            }

            self.in_buf.advance(HEADER_LEN);
            let mut payload = self.in_buf.split_to(payload_len);

            let message_type = header.message_type;
            let status = match Request::decode(message_type, &mut payload) {
                Ok(request) => {
                    ops::apply(bridge, &request);
                    0
                }
                Err(e) => {
                    warn!("malformed control request {}: {e}", header.id);
                    #[allow(clippy::cast_sign_loss)] // EINVAL is a small positive constant
                    let status = errno::EINVAL as u32;
                    status
                }
            };

            let response = ResponseHeader {
                for_id: header.id,
                status,
                payload_len: 0,
            };
            response.encode(&mut self.out_buf);
        }
        Ok(())
    }

    fn writable(&mut self) -> io::Result<()> {
        while !self.out_buf.is_empty() {
            match self.stream.write(&self.out_buf) {
                Ok(0) => return Err(io::Error::new(ErrorKind::WriteZero, "control socket closed")),
                Ok(n) => self.out_buf.advance(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn bind_listener(path: &str) -> Result<UnixListener, ServerError> {
    let _ = std::fs::remove_file(path);
    let std_listener = StdUnixListener::bind(path).map_err(|source| ServerError::Bind {
        path: path.to_string(),
        source,
    })?;
    std_listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::Bind {
            path: path.to_string(),
            source,
        })?;
    Ok(UnixListener::from_std(std_listener))
}

/// Start the control server on its own thread.
///
/// The returned handle's [`ServerHandle::shutdown`] stops the accept loop
/// and joins its thread; the bound socket file is left on disk for the
/// caller to remove, matching the `cpi` thread's own ctl-channel shutdown
/// convention.
pub fn start_server(config: &ServerConfig, bridge: Arc<ControlBridge>) -> Result<ServerHandle, ServerError> {
    let mut listener = bind_listener(&config.sock_path)?;
    let mut poll = Poll::new().map_err(ServerError::Poll)?;
    poll.registry()
        .register(&mut listener, LISTENER, Interest::READABLE)
        .map_err(ServerError::Poll)?;

    let (ctl_tx, ctl_rx) = crossbeam_channel::unbounded();
    let sock_path = config.sock_path.clone();

    let server_loop = move || {
        let mut events = Events::with_capacity(128);
        let mut connections: HashMap<Token, Connection> = HashMap::new();
        let mut next_token = 1_usize;
        info!("control socket listening at {sock_path}");

        'outer: loop {
            if let Err(e) = poll.poll(&mut events, Some(Duration::from_millis(250))) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                error!("control socket poll error: {e}");
                continue;
            }

            match ctl_rx.try_recv() {
                Ok(CtlMsg::Shutdown) => {
                    info!("control socket shutting down");
                    break 'outer;
                }
                Err(crossbeam_channel::TryRecvError::Empty) => {}
                Err(crossbeam_channel::TryRecvError::Disconnected) => break 'outer,
            }

            for event in &events {
                match event.token() {
                    LISTENER => loop {
                        match listener.accept() {
                            Ok((mut stream, _addr)) => {
                                let token = Token(next_token);
                                next_token += 1;
                                if let Err(e) = poll.registry().register(
                                    &mut stream,
                                    token,
                                    Interest::READABLE | Interest::WRITABLE,
                                ) {
                                    error!("registering control connection: {e}");
                                    continue;
                                }
                                connections.insert(token, Connection::new(stream));
                                debug!("accepted control connection {}", token.0);
                            }
                            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                            Err(e) => {
                                error!("accepting control connection: {e}");
                                break;
                            }
                        }
                    },
                    token => {
                        let mut close = false;
                        if let Some(conn) = connections.get_mut(&token) {
                            if event.is_readable() {
                                match conn.readable(&bridge) {
                                    Ok(true) => {}
                                    Ok(false) | Err(_) => close = true,
                                }
                            }
                            if !close && event.is_writable() {
                                if conn.writable().is_err() {
                                    close = true;
                                }
                            }
                        }
                        if close {
                            if let Some(mut conn) = connections.remove(&token) {
                                let _ = poll.registry().deregister(&mut conn.stream);
                            }
                            debug!("closed control connection {}", token.0);
                        }
                    }
                }
            }
        }
    };

    let thread = thread::Builder::new()
        .name("dataplane-control".to_string())
        .spawn(server_loop)
        .map_err(ServerError::Spawn)?;

    Ok(ServerHandle {
        ctl: ctl_tx,
        thread: Some(thread),
    })
}
