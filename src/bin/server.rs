use axum::{
    routing::{get, post},
    Extension, Router,
};
use medtrack_server::{api, migrator};
use sea_orm::{Database, DatabaseConnection};
use std::net::SocketAddr;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    medtrack_server::telemetry::init_telemetry("medtrack-server");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Database Connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Initialize Metrics
    medtrack_server::metrics::init_metrics(&db).await;

    let app = app(db, prometheus_layer, metric_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health_check() -> &'static str {
    "OK"
}

fn app(
    db: DatabaseConnection,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login));

    let protected_routes = Router::new()
        .route("/logout", post(api::auth::logout))
        .route(
            "/patients",
            get(api::patient::list_patients).post(api::patient::create_patient),
        )
        .route(
            "/patients/:id",
            get(api::patient::get_patient)
                .patch(api::patient::update_patient)
                .delete(api::patient::delete_patient),
        )
        .route(
            "/medications",
            get(api::medication::list_medications).post(api::medication::create_medication),
        )
        .route(
            "/medications/:id",
            get(api::medication::get_medication)
                .patch(api::medication::update_medication)
                .delete(api::medication::delete_medication),
        )
        .route(
            "/prescriptions",
            get(api::prescription::list_prescriptions).post(api::prescription::create_prescription),
        )
        .route(
            "/prescriptions/:id",
            get(api::prescription::get_prescription)
                .patch(api::prescription::update_prescription)
                .delete(api::prescription::delete_prescription),
        )
        .route(
            "/administrations",
            get(api::administration::list_administrations)
                .post(api::administration::create_administration),
        )
        .route(
            "/administrations/:id",
            axum::routing::delete(api::administration::delete_administration),
        )
        // Alert routes: create/update run the recurrence validator
        .route(
            "/alerts",
            get(api::alert::list_alerts).post(api::alert::create_alert),
        )
        .route(
            "/alerts/:id",
            get(api::alert::get_alert)
                .put(api::alert::update_alert)
                .delete(api::alert::delete_alert),
        )
        // Polling endpoint for the 5-minute look-ahead feed
        .route("/api/alerts/pending", get(api::alert::get_pending_alerts))
        .route("/api/dashboard", get(api::dashboard::get_dashboard))
        // User management - administrator only (enforced per handler)
        .route("/users", get(api::user::list_users))
        .route(
            "/users/:id",
            axum::routing::patch(api::user::update_user).delete(api::user::delete_user),
        )
        .route_layer(axum::middleware::from_fn(api::middleware::auth_middleware));

    let cors_origin =
        std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(Extension(db))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // Span name "METHOD /path" (e.g. "POST /alerts")
                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        // Fields populated by handlers
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        patient_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(
                    |_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                        // keep request start quiet; one line per request on response
                    },
                )
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(cors_origin.parse::<axum::http::HeaderValue>().unwrap())
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
}
