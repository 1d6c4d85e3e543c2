use axum::{http::Method, routing::MethodRouter};

use crate::app::AppContext;

/// A group of handlers sharing a URI prefix.
#[derive(Clone, Default, Debug)]
pub struct Routes {
    pub prefix: Option<String>,
    pub handlers: Vec<Handler>,
}

#[derive(Clone, Default, Debug)]
pub struct Handler {
    pub uri: String,
    pub method: MethodRouter<AppContext>,
    pub actions: Vec<Method>,
}

impl Routes {
    /// Creates a new [`Routes`] instance with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Routes`] instance with the given prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ontobind::controller::Routes;
    ///
    /// let routes = Routes::at("/api");
    /// assert_eq!(routes.prefix.as_deref(), Some("/api"));
    /// ```
    #[must_use]
    pub fn at(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }

    /// Adds a handler. `action` is the method the handler answers and is
    /// only used for listing routes.
    #[must_use]
    pub fn add(mut self, uri: &str, action: Method, method: MethodRouter<AppContext>) -> Self {
        self.handlers.push(Handler {
            uri: uri.to_owned(),
            method,
            actions: vec![action],
        });
        self
    }
}
