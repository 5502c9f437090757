use tracing::info;

/// Moves the host application to another view once the flow is done.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator for headless runs: records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        info!(route, "Navigating away from the connection flow.");
    }
}

/// Read-only view of the host's authentication state.
pub trait AuthStatus {
    fn is_loading(&self) -> bool;
}

/// Fixed auth state, for hosts without a real auth provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticAuth {
    pub loading: bool,
}

impl AuthStatus for StaticAuth {
    fn is_loading(&self) -> bool {
        self.loading
    }
}

/// What the host should show in place of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Flow,
}

impl Screen {
    /// Only the loading flag matters; the flow runs whatever the auth outcome.
    pub fn for_auth(auth: &impl AuthStatus) -> Self {
        if auth.is_loading() {
            Screen::Loading
        } else {
            Screen::Flow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_auth_shows_placeholder() {
        assert_eq!(Screen::for_auth(&StaticAuth { loading: true }), Screen::Loading);
        assert_eq!(Screen::for_auth(&StaticAuth { loading: false }), Screen::Flow);
    }
}
