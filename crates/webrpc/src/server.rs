// webrpc/src/server.rs
use crate::gateway::Gatewayer;
use crate::methods::{self, Handler};
use crate::protocol::{Request, Response};
use crate::{ErrorCode, RpcError, ServerError, ServerResult, JSONRPC_VERSION};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Server, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;

/// Default port of the RPC server
pub const DEFAULT_PORT: u16 = 6430;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port 0 picks a free port; see [`WebRpc::local_addr`]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
        }
    }
}

enum ServerState {
    Created,
    Running {
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<ServerResult<()>>,
    },
    ShuttingDown,
    Stopped,
}

/// Listener status published to `local_addr` waiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listener {
    Pending,
    Bound(SocketAddr),
    Closed,
}

/// Routes decoded requests to handlers
struct Dispatcher {
    gateway: Arc<dyn Gatewayer>,
    handlers: HashMap<&'static str, Handler>,
}

impl Dispatcher {
    async fn handle_request(
        &self,
        req: hyper::Request<Body>,
    ) -> Result<hyper::Response<Body>, hyper::Error> {
        if req.method() != Method::POST {
            return Ok(http_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "method not allowed".to_string(),
            ));
        }

        let body_bytes = hyper::body::to_bytes(req.into_body()).await?;

        let response = match serde_json::from_slice::<Value>(&body_bytes) {
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<Request>(value) {
                    Ok(request) => self.process_request(request).await,
                    Err(e) => {
                        tracing::debug!("request has the wrong shape: {}", e);
                        Response::error(id, RpcError::from_kind(ErrorCode::InvalidRequest))
                    }
                }
            }
            Err(e) => {
                tracing::debug!("decode request failed: {}", e);
                Response::error(Value::Null, RpcError::from_kind(ErrorCode::ParseError))
            }
        };

        let json = serde_json::to_string(&response).unwrap_or_else(|e| {
            tracing::error!("encode response failed: {}", e);
            format!(
                r#"{{"id":null,"jsonrpc":"{}","error":{{"code":{},"message":"{}"}}}}"#,
                JSONRPC_VERSION,
                ErrorCode::InternalError.code(),
                ErrorCode::InternalError.default_message()
            )
        });
        Ok(http_response(StatusCode::OK, json))
    }

    async fn process_request(&self, request: Request) -> Response {
        let id = request.id.clone();

        if request.jsonrpc != JSONRPC_VERSION {
            return Response::error(
                id,
                RpcError::new(ErrorCode::InvalidRequest, "invalid jsonrpc"),
            );
        }

        let handler = match self.handlers.get(request.method.as_str()) {
            Some(handler) => *handler,
            None => {
                tracing::debug!(method = %request.method, "method not found");
                return Response::error(id, RpcError::from_kind(ErrorCode::MethodNotFound));
            }
        };

        let method = request.method.clone();
        match tokio::spawn(handler(request, self.gateway.clone())).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_panic() {
                    tracing::error!(method = %method, "handler panicked");
                } else {
                    tracing::error!(method = %method, "handler task failed: {}", e);
                }
                Response::error(id, RpcError::from_kind(ErrorCode::InternalError))
            }
        }
    }
}

fn http_response(status: StatusCode, body: String) -> hyper::Response<Body> {
    let mut response = hyper::Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// JSON-RPC server
///
/// Lifecycle is `Created -> Running -> ShuttingDown -> Stopped`. A server
/// runs at most once; a failed bind also leaves it `Stopped`.
pub struct WebRpc {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    state: Mutex<ServerState>,
    listener: watch::Sender<Listener>,
}

impl WebRpc {
    pub fn new(config: ServerConfig, gateway: Arc<dyn Gatewayer>) -> Self {
        let (listener, _) = watch::channel(Listener::Pending);
        Self {
            config,
            dispatcher: Arc::new(Dispatcher {
                gateway,
                handlers: methods::handlers(),
            }),
            state: Mutex::new(ServerState::Created),
            listener,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind and start serving on a task owned by the server
    ///
    /// Returns the bound address. The task runs until
    /// [`shutdown`](Self::shutdown).
    pub async fn start(&self) -> ServerResult<SocketAddr> {
        let mut state = self.state.lock().await;
        if !matches!(*state, ServerState::Created) {
            return Err(ServerError::AlreadyStarted);
        }

        let builder = match Server::try_bind(&self.config.listen_addr) {
            Ok(builder) => builder,
            Err(e) => {
                tracing::error!("JSON-RPC server bind {} failed: {}", self.config.listen_addr, e);
                *state = ServerState::Stopped;
                self.listener.send_replace(Listener::Closed);
                return Err(ServerError::Bind(e));
            }
        };

        let dispatcher = self.dispatcher.clone();
        let make_svc = make_service_fn(move |_conn| {
            let dispatcher = dispatcher.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let dispatcher = dispatcher.clone();
                    async move { dispatcher.handle_request(req).await }
                }))
            }
        });

        let server = builder.serve(make_svc);
        let addr = server.local_addr();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let listener = self.listener.clone();
        self.listener.send_replace(Listener::Bound(addr));

        let task = tokio::spawn(async move {
            let result = server
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            listener.send_replace(Listener::Closed);

            match result {
                Ok(()) => {
                    tracing::info!("JSON-RPC server stopped");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("JSON-RPC server failed: {}", e);
                    Err(ServerError::Serve(e))
                }
            }
        });

        *state = ServerState::Running {
            shutdown: shutdown_tx,
            task,
        };
        tracing::info!("JSON-RPC server listening on {}", addr);
        Ok(addr)
    }

    /// Serve until stopped
    ///
    /// Returns `Ok` once a [`shutdown`](Self::shutdown) has begun and the
    /// listener is closed. If serving fails on its own, returns that error.
    pub async fn run(&self) -> ServerResult<()> {
        self.start().await?;

        let mut rx = self.listener.subscribe();
        let _ = rx.wait_for(|l| *l == Listener::Closed).await;

        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, ServerState::Stopped) {
            ServerState::Running { task, .. } => join_serve_task(task).await,
            other => {
                *state = other;
                Ok(())
            }
        }
    }

    /// Stop a running server
    ///
    /// Waits for in-flight requests to finish and for the serving task to
    /// end, and returns that task's result.
    pub async fn shutdown(&self) -> ServerResult<()> {
        let (shutdown, task) = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, ServerState::ShuttingDown) {
                ServerState::Running { shutdown, task } => (shutdown, task),
                other => {
                    *state = other;
                    return Err(ServerError::NotRunning);
                }
            }
        };

        tracing::info!("shutting down JSON-RPC server");
        let _ = shutdown.send(());
        let result = join_serve_task(task).await;
        *self.state.lock().await = ServerState::Stopped;
        result
    }

    /// Bound address; `None` once the listener is closed or failed to bind
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let mut rx = self.listener.subscribe();
        let listener = *rx.wait_for(|l| *l != Listener::Pending).await.ok()?;
        match listener {
            Listener::Bound(addr) => Some(addr),
            _ => None,
        }
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, ServerState::Running { .. })
    }
}

async fn join_serve_task(task: JoinHandle<ServerResult<()>>) -> ServerResult<()> {
    match task.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("JSON-RPC server task failed: {}", e);
            Err(ServerError::Task(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::fake::FakeGateway;
    use serde_json::json;

    fn dispatcher(gateway: FakeGateway) -> Dispatcher {
        Dispatcher {
            gateway: Arc::new(gateway),
            handlers: methods::handlers(),
        }
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let d = dispatcher(FakeGateway::default());
        let resp = d
            .process_request(Request::new("9", "no_such_method", None))
            .await;
        assert_eq!(resp.id, json!("9"));
        match resp.outcome {
            crate::Outcome::Error(e) => assert_eq!(e.kind(), Some(ErrorCode::MethodNotFound)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_version() {
        let d = dispatcher(FakeGateway::default());
        let mut req = Request::new("1", "get_status", None);
        req.jsonrpc = "1.0".into();
        let resp = d.process_request(req).await;
        assert!(resp.is_error());
    }

    #[tokio::test]
    async fn test_dispatch_status() {
        let d = dispatcher(FakeGateway::with_block(1, 0));
        let resp = d.process_request(Request::new(1, "get_status", None)).await;
        assert_eq!(resp.id, json!(1));
        match resp.outcome {
            crate::Outcome::Result(v) => assert_eq!(v["blockNum"], 2),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_post_rejected() {
        let d = dispatcher(FakeGateway::default());
        let req = hyper::Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let resp = d.handle_request(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let d = dispatcher(FakeGateway::default());
        let req = hyper::Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = d.handle_request(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["error"]["message"], "parse error");
    }

    struct PanickingGateway;

    #[async_trait::async_trait]
    impl Gatewayer for PanickingGateway {
        async fn get_last_blocks(&self, _n: u64) -> anyhow::Result<ledger_core::ReadableBlocks> {
            panic!("gateway bug")
        }
        async fn get_blocks(&self, _s: u64, _e: u64) -> anyhow::Result<ledger_core::ReadableBlocks> {
            unimplemented!()
        }
        async fn get_blocks_in_depth(
            &self,
            _seqs: &[u64],
        ) -> anyhow::Result<ledger_core::ReadableBlocks> {
            unimplemented!()
        }
        async fn get_unspent_outputs(
            &self,
            _filters: &[crate::OutputsFilter],
        ) -> anyhow::Result<ledger_core::ReadableOutputSet> {
            unimplemented!()
        }
        async fn get_transaction(
            &self,
            _txid: &ledger_crypto::Hash,
        ) -> anyhow::Result<Option<ledger_core::LedgerTransaction>> {
            unimplemented!()
        }
        async fn inject_transaction(&self, _txn: ledger_core::Transaction) -> anyhow::Result<()> {
            unimplemented!()
        }
        async fn get_addr_uxouts(
            &self,
            _address: &ledger_crypto::Address,
        ) -> anyhow::Result<Vec<ledger_core::UxOutJson>> {
            unimplemented!()
        }
        fn get_time_now(&self) -> u64 {
            0
        }
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let d = Dispatcher {
            gateway: Arc::new(PanickingGateway),
            handlers: methods::handlers(),
        };
        let resp = d.process_request(Request::new("1", "get_status", None)).await;
        match resp.outcome {
            crate::Outcome::Error(e) => assert_eq!(e.kind(), Some(ErrorCode::InternalError)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    async fn post(d: &Dispatcher, body: &'static str) -> Value {
        let req = hyper::Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from(body))
            .unwrap();
        let resp = d.handle_request(req).await.unwrap();
        let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_wrong_request_shape() {
        let d = dispatcher(FakeGateway::default());

        let value = post(&d, r#"{"id":1}"#).await;
        assert_eq!(value["id"], 1);
        assert_eq!(value["error"]["code"], -32600);
        assert_eq!(value["error"]["message"], "invalid request");

        let value = post(&d, "[1, 2]").await;
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], -32600);
    }

    fn ephemeral_config() -> ServerConfig {
        ServerConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shutdown_returns_after_serving_ends() {
        for _ in 0..50 {
            let server = WebRpc::new(ephemeral_config(), Arc::new(FakeGateway::default()));
            let addr = server.start().await.unwrap();
            assert_eq!(server.local_addr().await, Some(addr));

            server.shutdown().await.unwrap();
            assert!(!server.is_running().await);
            assert_eq!(server.local_addr().await, None);
            // The listening socket is already released
            std::net::TcpListener::bind(addr).unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_returns_once_shut_down() {
        let server = Arc::new(WebRpc::new(ephemeral_config(), Arc::new(FakeGateway::default())));
        let run = tokio::spawn({
            let server = server.clone();
            async move { server.run().await }
        });
        server.local_addr().await.unwrap();

        server.shutdown().await.unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), run)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_closes_listener() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ServerConfig {
            listen_addr: occupied.local_addr().unwrap(),
        };
        let server = WebRpc::new(config, Arc::new(FakeGateway::default()));

        assert!(matches!(server.start().await, Err(ServerError::Bind(_))));
        let addr = tokio::time::timeout(std::time::Duration::from_secs(2), server.local_addr())
            .await
            .unwrap();
        assert_eq!(addr, None);
        assert!(!server.is_running().await);
        assert!(matches!(server.run().await, Err(ServerError::AlreadyStarted)));
        assert!(matches!(server.shutdown().await, Err(ServerError::NotRunning)));
    }

    #[tokio::test]
    async fn test_shutdown_before_run() {
        let server = WebRpc::new(ServerConfig::default(), Arc::new(FakeGateway::default()));
        assert!(matches!(server.shutdown().await, Err(ServerError::NotRunning)));
    }
}
