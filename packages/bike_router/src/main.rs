use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::serve;
use axum::Router;
use bike_router::common::config::{
    RouteRequestConfig, ServerConfig, UserRouteConfig,
};
use bike_router::common::error::RoutingError;
use bike_router::common::graph_data::RoutingGraph;
use bike_router::loading::petgraph::create_graph;
use bike_router::loading::rows::read_rows;
use bike_router::routing::engine::{
    PlannedRoute, RouteRequest, plan_route, plan_routes,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
struct AppState {
    graph: Arc<RoutingGraph>,
}

/// Outcome of a single route within a batch
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum BatchItem {
    Success { route: PlannedRoute },
    Error { message: String },
}

fn error_response(status: StatusCode, message: String) -> Response {
    let json_response = json!({
        "status": "error",
        "message": message
    });

    (status, Json(json_response)).into_response()
}

fn routing_error_response(err: RoutingError) -> Response {
    let status = match err {
        RoutingError::NoPathFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, err.to_string())
}

/// Convert the user's query into a request between two graph nodes
fn resolve_query(
    graph: &RoutingGraph,
    query: UserRouteConfig,
) -> Result<Option<RouteRequest>, RoutingError> {
    let config: RouteRequestConfig = query.try_into()?;
    Ok(RouteRequest::resolve(graph, config))
}

async fn get_route(
    State(state): State<AppState>,
    Query(query): Query<UserRouteConfig>,
) -> Response {
    let now = Instant::now();

    let request = match resolve_query(&state.graph, query) {
        Ok(Some(request)) => request,
        Ok(None) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "No graph is loaded".to_string(),
            );
        }
        Err(err) => return routing_error_response(err),
    };

    let graph = Arc::clone(&state.graph);
    let result =
        tokio::task::spawn_blocking(move || plan_route(&graph, &request))
            .await;

    log::info!("Elapsed: {:.2?}", now.elapsed());

    match result {
        Ok(Ok(route)) => (StatusCode::OK, Json(route)).into_response(),
        Ok(Err(err)) => routing_error_response(err),
        Err(err) => {
            log::error!("Routing failed: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Routing failed".to_string(),
            )
        }
    }
}

async fn post_routes(
    State(state): State<AppState>,
    Json(queries): Json<Vec<UserRouteConfig>>,
) -> Response {
    let now = Instant::now();

    // Requests which can't be resolved are reported in place, the rest are
    // planned together
    let resolved: Vec<Result<RouteRequest, String>> = queries
        .into_iter()
        .map(|query| match resolve_query(&state.graph, query) {
            Ok(Some(request)) => Ok(request),
            Ok(None) => Err("No graph is loaded".to_string()),
            Err(err) => Err(err.to_string()),
        })
        .collect();
    let requests: Vec<RouteRequest> = resolved
        .iter()
        .filter_map(|item| item.as_ref().ok().cloned())
        .collect();

    let graph = Arc::clone(&state.graph);
    let planned = match tokio::task::spawn_blocking(move || {
        plan_routes(&graph, &requests)
    })
    .await
    {
        Ok(planned) => planned,
        Err(err) => {
            log::error!("Batch routing failed: {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Batch routing failed".to_string(),
            );
        }
    };

    let mut planned = planned.into_iter();
    let items: Vec<BatchItem> = resolved
        .into_iter()
        .map(|item| match item.map(|_| planned.next()) {
            Ok(Some(Ok(route))) => BatchItem::Success { route },
            Ok(Some(Err(err))) => BatchItem::Error {
                message: err.to_string(),
            },
            Ok(None) => BatchItem::Error {
                message: "Route was not planned".to_string(),
            },
            Err(message) => BatchItem::Error { message },
        })
        .collect();

    log::info!("{} routes processed in {:.2?}", items.len(), now.elapsed());

    (StatusCode::OK, Json(items)).into_response()
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let json_response = json!({
        "status": "success",
        "nodes": state.graph.node_count(),
        "edges": state.graph.edge_count()
    });

    Json(json_response)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .target(env_logger::Target::Stderr)
    .init();

    let config = ServerConfig::from_env();

    // The graph is built once, and only read from then on
    let rows = read_rows(&config.graph_file).unwrap_or_else(|err| {
        panic!("Error reading {}: {err}", config.graph_file.display())
    });
    let graph = create_graph(rows);
    if graph.node_count() == 0 {
        panic!("The graph in {} has no nodes!", config.graph_file.display());
    }

    let state = AppState {
        graph: Arc::new(graph),
    };

    let router = Router::new()
        .route("/healthcheck", get(health_check))
        .route("/route", get(get_route))
        .route("/routes", post(post_routes))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|err| {
            panic!("Error binding to {}: {err}", config.bind_addr)
        });
    log::info!("Serving routes on {}", config.bind_addr);
    serve(listener, router).await.expect("Error serving API!");
}
