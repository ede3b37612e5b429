// Application state module
// Shared by every connection: configuration, the function handler, and the shutdown flag

use tokio::sync::watch;

use super::types::Config;
use crate::invocation::Handler;

/// Application state
pub struct AppState {
    pub config: Config,
    pub handler: Handler,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let handler = Handler::with_url(config.function.upstream_url.clone());
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            handler,
            shutdown,
        }
    }

    /// Ask the accept loop and every open connection to stop
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Receiver that observes `request_shutdown`
    pub fn shutdown_listener(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Resolves once shutdown has been requested (or the state is gone)
pub async fn wait_for_shutdown(listener: &mut watch::Receiver<bool>) {
    let _ = listener.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_config;

    #[test]
    fn test_handler_uses_configured_upstream() {
        let state = AppState::new(test_config("http://127.0.0.1:1/todos"));
        assert_eq!(state.handler.url(), "http://127.0.0.1:1/todos");
    }

    #[tokio::test]
    async fn test_shutdown_reaches_listeners() {
        let state = AppState::new(test_config("http://127.0.0.1:1/todos"));
        let mut listener = state.shutdown_listener();
        assert!(!*listener.borrow());

        state.request_shutdown();

        assert!(*listener.wait_for(|stop| *stop).await.unwrap());
    }
}
