use std::net::SocketAddr;
use std::sync::Arc;

use crate::configuration::types::LabType;
use crate::error_handling::types::ManagerError;
use crate::lab_management::lab_manager::LabManager;
use crate::web_interface::types::{
    ApiError, ContainerStatus, HealthData, HealthResponse, StartLabData, StartLabRequest,
    StartLabResponse, StatusData, StatusResponse, StopLabRequest, StopLabResponse,
};

use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

/// Header carrying the authenticated user id.
///
/// Authentication itself is an external collaborator; whatever identity it
/// forwards here is trusted unconditionally.
const USER_HEADER: &str = "x-user-id";

/// Web server exposing the lab lifecycle API.
pub struct WebServer {
    manager: Arc<LabManager>,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(manager: Arc<LabManager>) -> Self {
        Self { manager }
    }

    /// Serve the API on the given address until the process exits.
    pub async fn start(&self, addr: SocketAddr) {
        let routes = Self::routes(self.manager.clone());
        warp::serve(routes).run(addr).await;
    }

    /// Route tree, separated from `start` so tests can drive it in-process.
    fn routes(
        manager: Arc<LabManager>,
    ) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
        // POST /api/labs/start -> launch a lab for the calling user
        let start_manager = manager.clone();
        let start_lab = warp::path!("api" / "labs" / "start")
            .and(warp::post())
            .and(warp::header::optional::<String>(USER_HEADER))
            .and(warp::body::json())
            .and_then(move |user: Option<String>, body: StartLabRequest| {
                let manager = start_manager.clone();
                async move {
                    let Some(user_id) = user else {
                        return Ok::<_, Rejection>(unauthorized());
                    };

                    let lab_type = match body.lab_type.parse::<LabType>() {
                        Ok(lab_type) => lab_type,
                        Err(e) => {
                            let res = reply::with_status(
                                reply::json(&ApiError::new(e.to_string())),
                                StatusCode::BAD_REQUEST,
                            )
                            .into_response();
                            return Ok::<_, Rejection>(res);
                        }
                    };

                    match manager.start_session(&user_id, lab_type).await {
                        Ok(started) => {
                            let res = reply::with_status(
                                reply::json(&StartLabResponse {
                                    success: true,
                                    message: format!(
                                        "{} lab started successfully",
                                        lab_type.as_str().to_uppercase()
                                    ),
                                    data: StartLabData {
                                        container_id: started.container_id,
                                        port: started.port,
                                        url: started.url,
                                        lab_type: lab_type.to_string(),
                                    },
                                }),
                                StatusCode::OK,
                            )
                            .into_response();
                            Ok::<_, Rejection>(res)
                        }
                        Err(e) => Ok::<_, Rejection>(error_response(&e)),
                    }
                }
            });

        // POST /api/labs/stop -> stop one container or all of the user's
        let stop_manager = manager.clone();
        let stop_lab = warp::path!("api" / "labs" / "stop")
            .and(warp::post())
            .and(warp::header::optional::<String>(USER_HEADER))
            .and(warp::body::json())
            .and_then(move |user: Option<String>, body: StopLabRequest| {
                let manager = stop_manager.clone();
                async move {
                    let Some(user_id) = user else {
                        return Ok::<_, Rejection>(unauthorized());
                    };

                    let result = manager
                        .stop_session(&user_id, body.container_id.as_deref())
                        .await;
                    match result {
                        Ok(()) => {
                            let message = if body.container_id.is_some() {
                                "Container stopped successfully"
                            } else {
                                "All user containers stopped successfully"
                            };
                            let res = reply::with_status(
                                reply::json(&StopLabResponse {
                                    success: true,
                                    message: message.to_string(),
                                }),
                                StatusCode::OK,
                            )
                            .into_response();
                            Ok::<_, Rejection>(res)
                        }
                        Err(e) => Ok::<_, Rejection>(error_response(&e)),
                    }
                }
            });

        // GET /api/labs/status -> the calling user's active containers
        let status_manager = manager.clone();
        let status = warp::path!("api" / "labs" / "status")
            .and(warp::get())
            .and(warp::header::optional::<String>(USER_HEADER))
            .and_then(move |user: Option<String>| {
                let manager = status_manager.clone();
                async move {
                    let Some(user_id) = user else {
                        return Ok::<_, Rejection>(unauthorized());
                    };

                    let sessions = manager.list_user_sessions(&user_id).await;
                    let res = reply::with_status(
                        reply::json(&StatusResponse {
                            success: true,
                            data: StatusData {
                                active_containers: sessions
                                    .iter()
                                    .map(ContainerStatus::from)
                                    .collect(),
                            },
                        }),
                        StatusCode::OK,
                    )
                    .into_response();
                    Ok::<_, Rejection>(res)
                }
            });

        // GET /api/labs/health -> runtime availability; never errors
        let health_manager = manager.clone();
        let health = warp::path!("api" / "labs" / "health")
            .and(warp::get())
            .and_then(move || {
                let manager = health_manager.clone();
                async move {
                    let available = manager.is_runtime_available().await;
                    let message = if available {
                        "Container runtime is available and ready"
                    } else {
                        "Container runtime is not available. Please ensure the Docker daemon is running."
                    };
                    let res = reply::with_status(
                        reply::json(&HealthResponse {
                            success: true,
                            data: HealthData {
                                docker_available: available,
                                message: message.to_string(),
                            },
                        }),
                        StatusCode::OK,
                    )
                    .into_response();
                    Ok::<_, Rejection>(res)
                }
            });

        start_lab.or(stop_lab).or(status).or(health)
    }
}

fn unauthorized() -> warp::reply::Response {
    reply::with_status(
        reply::json(&ApiError::new("Unauthorized")),
        StatusCode::UNAUTHORIZED,
    )
    .into_response()
}

fn error_response(err: &ManagerError) -> warp::reply::Response {
    let status = match err {
        ManagerError::Forbidden => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    reply::with_status(reply::json(&ApiError::new(err.to_string())), status).into_response()
}
