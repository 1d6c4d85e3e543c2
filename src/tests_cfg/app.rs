use axum::Router;

use super::{config::test_config, repo::RepoFixture};
use crate::{app::AppContext, boot, config::Config, environment::Environment};

/// A context together with the repository it was built from. Keep it alive
/// for as long as the context is used.
pub struct TestApp {
    pub ctx: AppContext,
    pub repo: RepoFixture,
}

impl TestApp {
    /// The full application router.
    ///
    /// # Panics
    ///
    /// Panics when the router cannot be built.
    #[must_use]
    pub fn router(&self) -> Router {
        boot::create_router(&self.ctx).expect("build router")
    }
}

/// Builds a context over a fresh fixture repository with an empty store.
///
/// # Panics
///
/// Panics when the fixture registry does not load.
#[must_use]
pub fn get_app_context() -> TestApp {
    get_app_context_with(|_| {})
}

/// Like [`get_app_context`], with `customize` applied to the test
/// configuration first.
///
/// # Panics
///
/// Panics when the fixture registry does not load.
#[must_use]
pub fn get_app_context_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let repo = super::repo::create();
    let mut config = test_config(repo.path());
    customize(&mut config);
    let ctx = boot::create_context(&Environment::Test, config).expect("create test context");
    TestApp { ctx, repo }
}
