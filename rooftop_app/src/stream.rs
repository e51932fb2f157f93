use std::io::{self, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use rooftop_stream::{encode_message, Command, Hello, MessageKind};
use thiserror::Error;

use crate::host::CommandSink;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream worker disconnected")]
    Disconnected,
    #[error("message encode failed: {0}")]
    Encode(#[from] rooftop_stream::ProtocolError),
}

enum WorkerCommand {
    Send(Vec<u8>),
    Shutdown,
}

/// Broadcasts the live command feed to a single connected subscriber.
pub struct StreamServer {
    sender: Sender<WorkerCommand>,
}

impl StreamServer {
    pub fn bind<A: ToSocketAddrs>(addr: A, build: Option<String>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).context("binding stream socket")?;
        listener
            .set_nonblocking(true)
            .context("setting stream listener non-blocking")?;
        let (tx, rx) = mpsc::channel();
        let build_info = build.unwrap_or_else(|| "dev".to_string());
        thread::Builder::new()
            .name("rooftop_stream".to_string())
            .spawn(move || worker_loop(listener, rx, build_info))
            .context("spawning stream worker thread")?;
        Ok(Self { sender: tx })
    }

    pub fn send_command(&self, command: &Command) -> Result<(), StreamError> {
        let bytes = encode_message(MessageKind::Command, command)?;
        self.sender
            .send(WorkerCommand::Send(bytes))
            .map_err(|_| StreamError::Disconnected)
    }
}

impl CommandSink for StreamServer {
    fn deliver(&mut self, command: &Command) -> anyhow::Result<()> {
        self.send_command(command).map_err(Into::into)
    }
}

impl Drop for StreamServer {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkerCommand::Shutdown);
    }
}

fn worker_loop(listener: TcpListener, rx: Receiver<WorkerCommand>, build_info: String) {
    let mut stream: Option<TcpStream> = None;
    loop {
        match rx.recv_timeout(Duration::from_millis(16)) {
            Ok(WorkerCommand::Send(buffer)) => {
                if let Some(conn) = stream.as_mut() {
                    if let Err(err) = write_all(conn, &buffer) {
                        eprintln!(
                            "[rooftop_app::stream] send failed: {err:?}; waiting for reconnect"
                        );
                        stream = None;
                    }
                }
            }
            Ok(WorkerCommand::Shutdown) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if stream.is_none() {
            match listener.accept() {
                Ok((mut conn, addr)) => {
                    if let Err(err) = conn.set_nodelay(true) {
                        eprintln!(
                            "[rooftop_app::stream] failed to configure connection from {addr}: {err:?}"
                        );
                        continue;
                    }
                    match send_hello(&mut conn, &build_info) {
                        Ok(()) => {
                            eprintln!("[rooftop_app::stream] subscriber connected from {addr}");
                            stream = Some(conn);
                        }
                        Err(err) => {
                            eprintln!(
                                "[rooftop_app::stream] handshake error with {addr}: {err:?}"
                            );
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
                Err(err) => {
                    eprintln!("[rooftop_app::stream] accept error: {err:?}");
                    thread::sleep(Duration::from_millis(200));
                }
            }
        }
    }
}

fn send_hello(stream: &mut TcpStream, build_info: &str) -> Result<(), io::Error> {
    let hello = Hello::new("rooftop_app", Some(build_info.to_string()));
    let message = encode_message(MessageKind::Hello, &hello)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    write_all(stream, &message)
}

fn write_all(stream: &mut TcpStream, bytes: &[u8]) -> io::Result<()> {
    let mut offset = 0;
    while offset < bytes.len() {
        match stream.write(&bytes[offset..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "remote closed connection",
                ))
            }
            Ok(written) => offset += written,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
