// session-coordinator/src/navigation.rs
use common::NavigationConfig;
use parking_lot::RwLock;

/// Page routing, as far as the coordinator cares about it
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn redirect_to(&self, path: &str);
}

/// Decides whether losing the session should move the user to sign-in
#[derive(Debug, Clone)]
pub struct RouteGuard {
    sign_in_path: String,
    public_paths: Vec<String>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::from(&NavigationConfig::default())
    }
}

impl From<&NavigationConfig> for RouteGuard {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            sign_in_path: config.sign_in_path.clone(),
            public_paths: config.public_paths.clone(),
        }
    }
}

impl RouteGuard {
    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// Sign-in, sign-up, landing and anything configured alongside them
    pub fn is_public(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        self.public_paths.iter().any(|public| {
            path == public
                || (public != "/" && path.strip_prefix(public.as_str()).is_some_and(|rest| rest.starts_with('/')))
        })
    }

    /// Redirect to sign-in unless the current view allows signed-out users
    pub fn enforce(&self, navigator: &dyn Navigator) -> bool {
        let current = navigator.current_path();
        if self.is_public(&current) {
            tracing::debug!("Staying on public view {}", current);
            return false;
        }

        tracing::info!("Redirecting from {} to {}", current, self.sign_in_path);
        navigator.redirect_to(&self.sign_in_path);
        true
    }
}

/// Navigator that keeps the current path and every redirect in memory
#[derive(Debug)]
pub struct HistoryNavigator {
    current: RwLock<String>,
    redirects: RwLock<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(initial_path.into()),
            redirects: RwLock::new(Vec::new()),
        }
    }

    /// Simulate the user moving to another view
    pub fn visit(&self, path: impl Into<String>) {
        *self.current.write() = path.into();
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.read().clone()
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.current.read().clone()
    }

    fn redirect_to(&self, path: &str) {
        self.redirects.write().push(path.to_string());
        *self.current.write() = path.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        let guard = RouteGuard::default();
        assert!(guard.is_public("/"));
        assert!(guard.is_public("/login"));
        assert!(guard.is_public("/login?next=/dashboard"));
        assert!(guard.is_public("/login/reset"));
        assert!(guard.is_public("/register"));
        assert!(!guard.is_public("/dashboard"));
        assert!(!guard.is_public("/loginx"));
        assert!(!guard.is_public("/dashboard/settings"));
    }

    #[test]
    fn test_enforce_redirects_protected_view_once() {
        let guard = RouteGuard::default();
        let navigator = HistoryNavigator::new("/dashboard/posts");

        assert!(guard.enforce(&navigator));
        // Now on the sign-in page, nothing more to do
        assert!(!guard.enforce(&navigator));
        assert_eq!(navigator.redirects(), vec!["/login".to_string()]);
        assert_eq!(navigator.current_path(), "/login");
    }

    #[test]
    fn test_enforce_leaves_public_view_alone() {
        let guard = RouteGuard::default();
        let navigator = HistoryNavigator::new("/register");
        assert!(!guard.enforce(&navigator));
        assert!(navigator.redirects().is_empty());

        navigator.visit("/settings/billing");
        assert!(guard.enforce(&navigator));
        assert_eq!(navigator.redirects(), vec!["/login".to_string()]);
    }

    #[test]
    fn test_custom_exception_list() {
        let guard = RouteGuard::from(&NavigationConfig {
            sign_in_path: "/signin".to_string(),
            public_paths: vec!["/signin".to_string(), "/pricing".to_string()],
        });
        assert_eq!(guard.sign_in_path(), "/signin");
        let navigator = HistoryNavigator::new("/");
        assert!(guard.enforce(&navigator));
        assert_eq!(navigator.redirects(), vec!["/signin".to_string()]);
    }
}
