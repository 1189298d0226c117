//! The gateway multiplexer.
//!
//! [`GatewayMux`] maps `(method, path template)` pairs to handlers. It is the
//! handler the server mounts under its catch-all route, so every request that
//! is not documentation ends up here.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use gantry_core::{response, BoxFuture, HttpHandler, HttpRequest, HttpResponse};
use http::{Method, StatusCode};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tonic::{Code, Status};

use crate::error::GatewayResult;
use crate::pattern::{PathParams, PathPattern};
use crate::status::{status_response, ErrorBody};

/// A handler that also receives the captured path parameters.
pub trait PathHandler: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, req: HttpRequest, params: PathParams) -> BoxFuture<'static, HttpResponse>;
}

impl<F, Fut> PathHandler for F
where
    F: Fn(HttpRequest, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    fn call(&self, req: HttpRequest, params: PathParams) -> BoxFuture<'static, HttpResponse> {
        Box::pin(self(req, params))
    }
}

struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Arc<dyn PathHandler>,
}

/// Routes JSON/HTTP requests to RPC-backed handlers.
///
/// Clones share one registration table, so a clone handed to the HTTP
/// router keeps seeing handlers registered through the original.
/// Handlers registered later take precedence over earlier ones for the same
/// method and path.
///
/// # Example
///
/// ```rust
/// use gantry_gateway::GatewayMux;
/// use http::Method;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// struct GetUser { id: String }
///
/// #[derive(Serialize)]
/// struct User { id: String, name: String }
///
/// let mux = GatewayMux::new();
/// mux.handle_json(Method::GET, "/v1/users/{id}", |req: GetUser| async move {
///     Ok::<_, tonic::Status>(User { id: req.id, name: "Ada".into() })
/// })
/// .unwrap();
/// assert_eq!(mux.route_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct GatewayMux {
    routes: Arc<RwLock<Vec<Route>>>,
}

enum Lookup {
    Found(Arc<dyn PathHandler>, PathParams),
    MethodMismatch,
    NotFound,
}

impl GatewayMux {
    /// Creates an empty multiplexer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Registers a raw handler for `method` and `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidPattern` if `pattern` does not parse.
    pub fn handle_path(
        &self,
        method: Method,
        pattern: &str,
        handler: impl PathHandler,
    ) -> GatewayResult<()> {
        let pattern = PathPattern::parse(pattern)?;
        tracing::debug!(http.method = %method, pattern = %pattern.as_str(), "registered gateway route");

        self.routes.write().insert(
            0,
            Route {
                method,
                pattern,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Registers a typed JSON handler.
    ///
    /// The request body (or `{}` when empty) is merged with the path
    /// parameters, which are inserted as strings and override body fields of
    /// the same name, and then deserialized into `Req`. A body that is not a
    /// JSON object, or that does not deserialize, is answered with
    /// `InvalidArgument`. `Ok` values are returned as `200` JSON and `Err`
    /// statuses are translated by [`status_response`].
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidPattern` if `pattern` does not parse.
    pub fn handle_json<Req, Res, F, Fut>(
        &self,
        method: Method,
        pattern: &str,
        f: F,
    ) -> GatewayResult<()>
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, Status>> + Send + 'static,
    {
        let f = Arc::new(f);
        self.handle_path(method, pattern, move |req: HttpRequest, params: PathParams| {
            let f = Arc::clone(&f);
            async move {
                let input = match decode_request::<Req>(req.body(), &params) {
                    Ok(input) => input,
                    Err(status) => return status_response(&status),
                };
                match (*f)(input).await {
                    Ok(output) => response::json(StatusCode::OK, &output),
                    Err(status) => status_response(&status),
                }
            }
        })
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let routes = self.routes.read();
        let mut path_matched = false;

        for route in routes.iter() {
            if let Some(params) = route.pattern.match_path(path) {
                if route.method == *method {
                    return Lookup::Found(Arc::clone(&route.handler), params);
                }
                path_matched = true;
            }
        }

        if path_matched {
            Lookup::MethodMismatch
        } else {
            Lookup::NotFound
        }
    }

    /// Dispatches a request to the matching handler.
    pub async fn dispatch(&self, req: HttpRequest) -> HttpResponse {
        match self.lookup(req.method(), req.uri().path()) {
            Lookup::Found(handler, params) => handler.call(req, params).await,
            Lookup::MethodMismatch => response::json(
                StatusCode::NOT_IMPLEMENTED,
                &ErrorBody {
                    code: Code::Unimplemented as i32,
                    message: "Method Not Allowed".to_string(),
                    details: Vec::new(),
                },
            ),
            Lookup::NotFound => response::json(
                StatusCode::NOT_FOUND,
                &ErrorBody {
                    code: Code::NotFound as i32,
                    message: "Not Found".to_string(),
                    details: Vec::new(),
                },
            ),
        }
    }
}

impl HttpHandler for GatewayMux {
    fn call(&self, req: HttpRequest) -> BoxFuture<'static, HttpResponse> {
        let mux = self.clone();
        Box::pin(async move { mux.dispatch(req).await })
    }
}

impl fmt::Debug for GatewayMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.routes.read();
        f.debug_struct("GatewayMux")
            .field(
                "routes",
                &routes
                    .iter()
                    .map(|r| format!("{} {}", r.method, r.pattern.as_str()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn decode_request<Req: DeserializeOwned>(body: &[u8], params: &PathParams) -> Result<Req, Status> {
    let mut value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice::<Value>(body)
            .map_err(|e| Status::invalid_argument(format!("invalid request body: {e}")))?
    };

    if !params.is_empty() {
        let Value::Object(object) = &mut value else {
            return Err(Status::invalid_argument(
                "request body must be a JSON object",
            ));
        };
        for (name, param) in params.iter() {
            object.insert(name.to_string(), Value::String(param.to_string()));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| Status::invalid_argument(format!("invalid request: {e}")))
}
