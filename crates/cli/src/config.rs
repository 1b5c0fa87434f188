//! Orchestrator configuration loaded from environment variables.

use std::path::PathBuf;

/// Deployment-level settings for the orchestrator.
///
/// All fields have defaults matching the reference deployment; override
/// via environment variables (a `.env` file is honored).
///
/// | Env Var                  | Default                  |
/// |--------------------------|--------------------------|
/// | `WORKER_BIN`             | `briefing-worker`        |
/// | `CONFIGS_DIR`            | `configs`                |
/// | `OUTPUT_DIR`             | `output`                 |
/// | `LOGS_DIR`               | `logs`                   |
/// | `ENV_FILE`               | `.env`                   |
/// | `EMBED_LOCAL_ORIGIN`     | `http://127.0.0.1:8080`  |
/// | `EMBED_CONTAINER_ORIGIN` | `http://embed:3000`      |
/// | `EMBED_COMPOSE_SERVICE`  | `embed`                  |
/// | `EMBED_LOCAL_SERVER`     | `embed-server`           |
/// | `FEED_GATEWAY_ORIGIN`    | `http://127.0.0.1:1200`  |
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Worker program invoked once per job.
    pub worker_program: String,
    /// Directory holding one `<job>.yaml` source config per job.
    pub configs_dir: PathBuf,
    /// Root under which each job gets its own output directory.
    pub output_root: PathBuf,
    /// Directory for per-job log sinks and the local backend log.
    pub logs_dir: PathBuf,
    /// Durable key=value file carrying `MODE` and `ORIGIN`.
    pub env_file: PathBuf,
    /// Backend base URL when running as a local host process.
    pub local_origin: String,
    /// Backend base URL when running containerized.
    pub container_origin: String,
    /// `docker compose` service name of the containerized backend.
    pub compose_service: String,
    /// Local backend server binary (also the `pkill -f` pattern).
    pub local_server: String,
    /// Feed-aggregation gateway base URL (readiness-gated only).
    pub gateway_origin: String,
}

impl OrchestratorConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        Self {
            worker_program: var("WORKER_BIN", "briefing-worker"),
            configs_dir: PathBuf::from(var("CONFIGS_DIR", "configs")),
            output_root: PathBuf::from(var("OUTPUT_DIR", "output")),
            logs_dir: PathBuf::from(var("LOGS_DIR", "logs")),
            env_file: PathBuf::from(var("ENV_FILE", ".env")),
            local_origin: var("EMBED_LOCAL_ORIGIN", "http://127.0.0.1:8080"),
            container_origin: var("EMBED_CONTAINER_ORIGIN", "http://embed:3000"),
            compose_service: var("EMBED_COMPOSE_SERVICE", "embed"),
            local_server: var("EMBED_LOCAL_SERVER", "embed-server"),
            gateway_origin: var("FEED_GATEWAY_ORIGIN", "http://127.0.0.1:1200"),
        }
    }

    /// Gateway readiness endpoint.
    pub fn gateway_health_url(&self) -> String {
        format!("{}/healthz", self.gateway_origin.trim_end_matches('/'))
    }
}
