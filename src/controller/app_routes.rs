//! Collects every controller's [`Routes`] and turns them into one axum
//! [`Router`] with the middleware stack applied.

use std::fmt;

use axum::{
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    routing::MethodRouter,
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{files, graph, load, method_not_allowed, monitoring, ontologies, query, rebind, Routes};
use crate::{app::AppContext, Result};

#[derive(Clone, Default)]
pub struct AppRoutes {
    routes: Vec<Routes>,
}

#[derive(Clone, Debug)]
pub struct ListRoutes {
    pub uri: String,
    pub actions: Vec<Method>,
    pub method: MethodRouter<AppContext>,
}

impl fmt::Display for ListRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions = self
            .actions
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "[{actions}] {}", self.uri)
    }
}

impl AppRoutes {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every route the server exposes.
    #[must_use]
    pub fn with_default_routes() -> Self {
        Self::empty().add_routes(vec![
            monitoring::routes(),
            load::routes(),
            query::routes(),
            graph::routes(),
            ontologies::routes(),
            rebind::routes(),
            files::routes(),
        ])
    }

    #[must_use]
    pub fn add_routes(mut self, routes: Vec<Routes>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Flattens the registered groups into full URIs.
    #[must_use]
    pub fn collect(&self) -> Vec<ListRoutes> {
        self.routes
            .iter()
            .flat_map(|routes| {
                let group = routes.prefix.as_deref().unwrap_or_default();
                routes.handlers.iter().map(move |handler| ListRoutes {
                    uri: join_uri(&[group, handler.uri.as_str()]),
                    actions: handler.actions.clone(),
                    method: handler.method.clone(),
                })
            })
            .collect()
    }

    /// Builds the router. Unsupported methods on a known path answer 405,
    /// bodies above `server.body_limit` answer 413.
    ///
    /// # Errors
    ///
    /// Fails when `server.body_limit` is not a valid size.
    pub fn to_router(&self, ctx: AppContext) -> Result<Router> {
        let mut app: Router<AppContext> = Router::new();
        for route in self.collect() {
            tracing::debug!(route = %route, "registering route");
            app = app.route(&route.uri, route.method.fallback(method_not_allowed));
        }

        let body_limit = ctx.config.server.body_limit_bytes()?;
        let app = app
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                ctx.config.server.request_timeout(),
            ))
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http());

        Ok(app.with_state(ctx))
    }
}

fn join_uri(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}
