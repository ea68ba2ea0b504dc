//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rustls::pki_types::CertificateDer;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message as Frame};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use ws_gateway::config::GatewayConfig;
use ws_gateway::http::{GatewayServer, RuntimeState, ServerError};
use ws_gateway::net::{load_tls_config, SessionTracker};
use ws_gateway::protocol::{self, Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const ORIGIN: &str = "https://client.example";

/// Self-signed `localhost` certificate written to a temporary directory.
pub struct TestCerts {
    _dir: TempDir,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub cert_der: CertificateDer<'static>,
}

impl TestCerts {
    pub fn generate() -> Self {
        let certified =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let dir = TempDir::new().unwrap();
        let cert_path = dir.path().join("server.crt");
        let key_path = dir.path().join("server.key");
        std::fs::write(&cert_path, certified.cert.pem()).unwrap();
        std::fs::write(&key_path, certified.key_pair.serialize_pem()).unwrap();

        Self {
            _dir: dir,
            cert_path,
            key_path,
            cert_der: certified.cert.der().clone(),
        }
    }

    fn connector(&self) -> Connector {
        let mut roots = rustls::RootCertStore::empty();
        roots.add(self.cert_der.clone()).unwrap();

        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Connector::Rustls(Arc::new(config))
    }
}

/// A gateway running on an ephemeral loopback port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub certs: TestCerts,
    pub tracker: SessionTracker,
    pub state: watch::Receiver<RuntimeState>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl TestGateway {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut GatewayConfig)) -> Self {
        let certs = TestCerts::generate();

        let mut config = GatewayConfig::default();
        config.listener.host = "127.0.0.1".into();
        config.listener.port = 0;
        config.tls.cert_path = certs.cert_path.clone();
        config.tls.key_path = certs.key_path.clone();
        config.shutdown.close_timeout_ms = 300;
        customize(&mut config);

        let tls = load_tls_config(&config.tls.cert_path, &config.tls.key_path)
            .await
            .unwrap();
        let server = GatewayServer::new(config);
        let handle = server.handle();
        let tracker = server.tracker().clone();
        let state = server.subscribe_state();

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server.run(tls, async move {
            let _ = stopped.await;
        }));

        let addr = tokio::time::timeout(Duration::from_secs(5), handle.listening())
            .await
            .expect("server should start listening")
            .expect("server should bind");

        let mut ready = state.clone();
        tokio::time::timeout(Duration::from_secs(5), ready.wait_for(|s| *s == RuntimeState::Accepting))
            .await
            .expect("server should reach Accepting")
            .unwrap();

        Self {
            addr,
            certs,
            tracker,
            state,
            stop: Some(stop),
            task,
        }
    }

    /// Open a `wss://localhost/ws` session with the given `Origin` header.
    pub async fn connect(&self, origin: Option<&str>) -> Result<Client, tungstenite::Error> {
        let mut request = format!("wss://localhost:{}/ws", self.addr.port())
            .into_client_request()?;
        if let Some(origin) = origin {
            request
                .headers_mut()
                .insert("Origin", HeaderValue::from_str(origin).unwrap());
        }

        let stream = TcpStream::connect(self.addr).await?;
        let (client, _) = tokio_tungstenite::client_async_tls_with_config(
            request,
            stream,
            None,
            Some(self.certs.connector()),
        )
        .await?;
        Ok(client)
    }

    /// Deliver the termination signal.
    pub fn signal(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    pub async fn wait_for_state(&mut self, wanted: RuntimeState) {
        tokio::time::timeout(Duration::from_secs(10), self.state.wait_for(|s| *s == wanted))
            .await
            .unwrap_or_else(|_| panic!("server never reached {wanted:?}"))
            .unwrap();
    }

    pub async fn wait_idle(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.tracker.wait_idle())
            .await
            .expect("sessions should drain");
    }

    /// Signal shutdown and wait for `run` to return.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        self.signal();
        tokio::time::timeout(Duration::from_secs(15), self.task)
            .await
            .expect("server should stop")
            .unwrap()
    }
}

pub async fn send_json(client: &mut Client, json: &str) {
    client.send(Frame::text(json)).await.unwrap();
}

/// Next application message, skipping control frames.
pub async fn recv_message(client: &mut Client) -> Message {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .unwrap();
        match frame {
            Frame::Text(text) => return protocol::decode(text.as_str()).unwrap(),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

/// Wait for the server's close frame and return its code.
pub async fn recv_close(client: &mut Client, within: Duration) -> Option<u16> {
    loop {
        let next = tokio::time::timeout(within, client.next())
            .await
            .expect("timed out waiting for close");
        match next {
            Some(Ok(Frame::Close(frame))) => return frame.map(|f| u16::from(f.code)),
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => return None,
        }
    }
}

pub async fn close_normally(client: &mut Client) {
    client
        .close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "bye".into(),
        }))
        .await
        .unwrap();
}
