use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use screening_core::{
    config::Config,
    pipeline::ScreeningCore,
    schema::{PredictResponse, StudentProfile},
};
use serde_json::json;
use std::{path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod page;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Listen address
    #[arg(long, env = "SCREENING_BIND")]
    bind: Option<String>,

    /// Directory containing the artifacts or a model_artifacts/ subdirectory
    #[arg(long, env = "SCREENING_ARTIFACT_DIR")]
    artifact_dir: Option<PathBuf>,

    /// Exit instead of serving the error page when artifacts fail to load
    #[arg(long, default_value_t = false)]
    strict: bool,
}

/// Startup outcome; fixed for the life of the process.
#[derive(Clone)]
enum Core {
    Ready(Arc<ScreeningCore>),
    Unavailable(Arc<str>),
}

#[derive(Clone)]
struct AppState {
    core: Core,
    prom: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut cfg = Config::default();
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }
    if let Some(dir) = args.artifact_dir {
        cfg.artifact_dir = dir;
    }

    // metrics
    let prom = PrometheusBuilder::new().install_recorder()?;

    let core = match ScreeningCore::load(&cfg) {
        Ok(core) => Core::Ready(Arc::new(core)),
        Err(e) if args.strict => return Err(e.into()),
        Err(e) => {
            tracing::error!(error = %e, "artifacts unavailable; serving error page only");
            Core::Unavailable(Arc::from(e.to_string()))
        }
    };

    let app = app(AppState { core, prom });

    let listener = tokio::net::TcpListener::bind(&cfg.bind).await?;
    tracing::info!("screening-server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed");
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_api))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(st): State<AppState>) -> Html<String> {
    match &st.core {
        Core::Ready(_) => Html(page::render(&StudentProfile::default(), None)),
        Core::Unavailable(e) => Html(page::unavailable(e)),
    }
}

/// Errors render inline under the form; the user can fix and resubmit.
async fn predict_form(
    State(st): State<AppState>,
    form: Result<Form<StudentProfile>, FormRejection>,
) -> Html<String> {
    let core = match &st.core {
        Core::Ready(core) => core,
        Core::Unavailable(e) => return Html(page::unavailable(e)),
    };

    let profile = match form {
        Ok(Form(p)) => p,
        Err(rej) => {
            metrics::counter!("predict_error_total").increment(1);
            tracing::warn!(error = %rej.body_text(), "form rejected");
            // a rejected body has no typed profile to echo back; the form resets to defaults
            return Html(page::render(
                &StudentProfile::default(),
                Some(page::Outcome::Error(rej.body_text())),
            ));
        }
    };

    let body = match core.assess(&profile) {
        Ok(resp) => page::render(&profile, Some(page::Outcome::Prediction(&resp))),
        Err(e) => page::render(&profile, Some(page::Outcome::Error(e.to_string()))),
    };
    Html(body)
}

async fn predict_api(
    State(st): State<AppState>,
    body: Result<Json<StudentProfile>, JsonRejection>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<serde_json::Value>)> {
    let core = match &st.core {
        Core::Ready(core) => core,
        Core::Unavailable(e) => {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    };
    let profile = match body {
        Ok(Json(p)) => p,
        Err(rej) => {
            metrics::counter!("predict_error_total").increment(1);
            tracing::warn!(error = %rej.body_text(), "json body rejected");
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": rej.body_text() })),
            ));
        }
    };
    core.assess(&profile).map(Json).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": e.to_string() })),
        )
    })
}

async fn healthz(State(st): State<AppState>) -> Response {
    match &st.core {
        Core::Ready(_) => (StatusCode::OK, "ok").into_response(),
        Core::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

async fn metrics(State(st): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, st.prom.render())
}
