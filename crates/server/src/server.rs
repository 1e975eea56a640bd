use std::{sync::Arc, time::Instant};

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
    typed_header::{TypedHeaderRejection, TypedHeaderRejectionReason},
};

use crate::{ServerError, auth, expenses, limits};
use engine::Engine;

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Identity of the caller, inserted by [`require_user`].
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub i64);

/// `TypedHeader` for the caller identity
///
/// Every `/api` request must carry a positive integer in "x-user-id".
#[derive(Debug)]
struct UserIdHeader(i64);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        match value.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(UserIdHeader(id)),
            _ => Err(AxumError::invalid()),
        }
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(axum::http::HeaderValue::from(self.0)));
    }
}

async fn require_user(
    header: Result<TypedHeader<UserIdHeader>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let TypedHeader(UserIdHeader(user_id)) = header.map_err(|rejection| {
        match rejection.reason() {
            TypedHeaderRejectionReason::Missing => {
                ServerError::Unauthorized("missing x-user-id header".to_string())
            }
            _ => ServerError::Generic("invalid x-user-id header".to_string()),
        }
    })?;

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

async fn trace_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "request handled"
    );
    response
}

pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };

    let api = Router::new()
        .route("/expenses", post(expenses::create).get(expenses::list))
        .route("/expenses/weekly", get(expenses::weekly))
        .route("/expenses/{id}", delete(expenses::remove))
        .route("/users/limit", get(limits::get).put(limits::set))
        .route_layer(middleware::from_fn(require_user));

    Router::new()
        .nest("/api", api)
        .route("/auth/login", post(auth::login))
        .layer(middleware::from_fn(trace_requests))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
