use axum::{
    http::{header, Method},
    Router,
};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::web::api::{create_router, AppState};

/// Configuration for the web server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub enable_cors: bool,
    pub max_sessions: usize,
    pub session_timeout_minutes: u64,
    pub max_buckets: usize,
    /// Bound on snapshots times buckets for one stored trace
    pub max_trace_cells: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3005,
            enable_cors: true,
            max_sessions: 1000,
            session_timeout_minutes: 60,
            max_buckets: 100_000,
            max_trace_cells: 50_000_000,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `DIAL_TRACE_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = parse_var(&lookup, "DIAL_TRACE_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "DIAL_TRACE_PORT") {
            config.port = port;
        }
        if let Some(enable_cors) = parse_var(&lookup, "DIAL_TRACE_CORS") {
            config.enable_cors = enable_cors;
        }
        if let Some(max_sessions) = parse_var(&lookup, "DIAL_TRACE_MAX_SESSIONS") {
            config.max_sessions = max_sessions;
        }
        if let Some(timeout) = parse_var(&lookup, "DIAL_TRACE_SESSION_TIMEOUT") {
            config.session_timeout_minutes = timeout;
        }
        if let Some(max_buckets) = parse_var(&lookup, "DIAL_TRACE_MAX_BUCKETS") {
            config.max_buckets = max_buckets;
        }
        if let Some(max_trace_cells) = parse_var(&lookup, "DIAL_TRACE_MAX_TRACE_CELLS") {
            config.max_trace_cells = max_trace_cells;
        }
        config
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring invalid value {:?} for {}", raw, key);
            None
        }
    }
}

/// Builds the application router with state and middleware from `config`
pub fn build_app(config: &ServerConfig) -> Router {
    let app_state = AppState::new(config.max_sessions, config.session_timeout_minutes)
        .with_max_buckets(config.max_buckets)
        .with_max_trace_cells(config.max_trace_cells);
    let app = Router::new().merge(create_router()).with_state(app_state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        app.layer(ServiceBuilder::new().layer(cors).into_inner())
    } else {
        app
    }
}

/// Start the web server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_app(&config);
    let addr = config.addr();

    log::info!("Dial trace server starting on http://{}", addr);
    log::info!(
        "Sessions: max {}, timeout {} minutes, CORS {}",
        config.max_sessions,
        config.session_timeout_minutes,
        if config.enable_cors { "enabled" } else { "disabled" }
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DIAL_TRACE_PORT", "8080"),
            ("DIAL_TRACE_MAX_SESSIONS", "5"),
            ("DIAL_TRACE_CORS", "false"),
            ("DIAL_TRACE_SESSION_TIMEOUT", "not-a-number"),
            ("DIAL_TRACE_MAX_TRACE_CELLS", "1000"),
        ]);
        let config = ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.port, 8080);
        assert_eq!(config.max_sessions, 5);
        assert!(!config.enable_cors);
        assert_eq!(config.session_timeout_minutes, 60);
        assert_eq!(config.max_trace_cells, 1000);
        assert_eq!(config.addr(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
    }
}
