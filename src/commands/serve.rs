use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::compile::CompiledPlan;
use crate::output;

/// Handles the 'serve' command - serves the compiled artifacts over HTTP
pub struct ServeCommand;

/// Shared application state
#[derive(Clone)]
struct AppState {
    artifacts: Arc<Artifacts>,
}

/// Artifact documents rendered to JSON once at startup and shared read-only
/// across responses.
struct Artifacts {
    rso: String,
    graph: String,
    map: String,
    plan: String,
    diagnostics: String,
}

impl Artifacts {
    fn render(compiled: &CompiledPlan) -> Result<Self> {
        Ok(Self {
            rso: serde_json::to_string(&compiled.overview)
                .context("Failed to serialize overview")?,
            graph: serde_json::to_string(&compiled.graph).context("Failed to serialize graph")?,
            map: serde_json::to_string(&compiled.map).context("Failed to serialize map")?,
            plan: serde_json::to_string(&compiled.plan).context("Failed to serialize plan")?,
            diagnostics: serde_json::to_string(&compiled.diagnostics)
                .context("Failed to serialize diagnostics")?,
        })
    }
}

impl ServeCommand {
    /// Execute the serve command
    pub fn execute(compiled: &CompiledPlan, host: Option<String>, port: Option<u16>) -> Result<()> {
        let port = port.unwrap_or(9000);
        let host = host.unwrap_or_else(|| "0.0.0.0".to_string());
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .context("Invalid host or port")?;

        let state = AppState {
            artifacts: Arc::new(Artifacts::render(compiled)?),
        };

        let app = Router::new()
            .route("/", get(serve_index))
            .route("/api/rso", get(get_rso))
            .route("/api/graph", get(get_graph))
            .route("/api/map", get(get_map))
            .route("/api/plan", get(get_plan))
            .route("/api/diagnostics", get(get_diagnostics))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(state);

        output::blank();
        output::success(&format!("Server started at http://{host}:{port}"));
        output::dimmed("Press Ctrl+C to stop");
        output::blank();

        let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
        runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .context("Failed to bind to address")?;

            axum::serve(listener, app)
                .await
                .context("Failed to start server")?;

            Ok::<(), anyhow::Error>(())
        })?;

        Ok(())
    }
}

async fn serve_index() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>plansight</title></head><body>\
         <h1>plansight</h1>\
         <ul>\
         <li><a href=\"/api/rso\">/api/rso</a></li>\
         <li><a href=\"/api/graph\">/api/graph</a></li>\
         <li><a href=\"/api/map\">/api/map</a></li>\
         <li><a href=\"/api/plan\">/api/plan</a></li>\
         <li><a href=\"/api/diagnostics\">/api/diagnostics</a></li>\
         </ul></body></html>",
    )
}

fn json_document(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

async fn get_rso(State(state): State<AppState>) -> Response {
    json_document(state.artifacts.rso.clone())
}

async fn get_graph(State(state): State<AppState>) -> Response {
    json_document(state.artifacts.graph.clone())
}

async fn get_map(State(state): State<AppState>) -> Response {
    json_document(state.artifacts.map.clone())
}

async fn get_plan(State(state): State<AppState>) -> Response {
    json_document(state.artifacts.plan.clone())
}

async fn get_diagnostics(State(state): State<AppState>) -> Response {
    json_document(state.artifacts.diagnostics.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::plan::types::Plan;

    #[test]
    fn test_artifacts_render_as_valid_json() {
        let compiled = compile(&Plan::default(), false).unwrap();
        let artifacts = Artifacts::render(&compiled).unwrap();

        for doc in [
            &artifacts.rso,
            &artifacts.graph,
            &artifacts.map,
            &artifacts.plan,
            &artifacts.diagnostics,
        ] {
            serde_json::from_str::<serde_json::Value>(doc).unwrap();
        }
    }
}
