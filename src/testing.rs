//! In-process HTTP stub standing in for the remote directory in tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Clone)]
enum Route {
    Json(String),
    Hang,
}

#[derive(Default)]
struct Routes {
    paths: HashMap<String, Route>,
    hits: HashMap<String, usize>,
}

type SharedRoutes = Arc<Mutex<Routes>>;

pub(crate) struct StubServer {
    addr: SocketAddr,
    routes: SharedRoutes,
    serve_task: JoinHandle<()>,
}

impl StubServer {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = SharedRoutes::default();

        let app = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&routes));
        let serve_task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            routes,
            serve_task,
        }
    }

    /// Answer GET `path` with 200 and `body`.
    pub(crate) fn serve(&self, path: &str, body: &str) {
        self.routes
            .lock()
            .paths
            .insert(path.to_owned(), Route::Json(body.to_owned()));
    }

    /// Accept GET `path` and never answer.
    pub(crate) fn hang(&self, path: &str) {
        self.routes.lock().paths.insert(path.to_owned(), Route::Hang);
    }

    pub(crate) fn hits(&self, path: &str) -> usize {
        self.routes.lock().hits.get(path).copied().unwrap_or(0)
    }

    /// Absolute URL for `path_pattern`, e.g. `/subscribers/%s`.
    pub(crate) fn template(&self, path_pattern: &str) -> String {
        format!("http://{}{}", self.addr, path_pattern)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.serve_task.abort();
    }
}

async fn respond(State(routes): State<SharedRoutes>, uri: Uri) -> Response {
    let path = uri.path().to_owned();
    let route = {
        let mut routes = routes.lock();
        *routes.hits.entry(path.clone()).or_insert(0) += 1;
        routes.paths.get(&path).cloned()
    };

    match route {
        Some(Route::Json(body)) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Some(Route::Hang) => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
