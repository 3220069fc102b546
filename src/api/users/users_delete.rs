#![forbid(unsafe_code)]

use std::sync::Arc;
use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, param::Path, ApiResponse };
use log::{error, info};

use crate::utils::errors::HttpResult;
use crate::utils::directory::{UserDirectory, DirectoryError};
use crate::utils::dir_utils::{self, RequestDebug};

const DELETED_MSG: &str = "deleted";

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct DeleteUserApi
{
    directory: Arc<UserDirectory>,
}

impl DeleteUserApi {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self {directory}
    }
}

struct ReqDeleteUser
{
    id: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqDeleteUser {
    type Req = ReqDeleteUser;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request parameters:");
        s.push_str("\n    id: ");
        s.push_str(&self.id);
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DirResponse {
    #[oai(status = 200)]
    Http200(Json<HttpResult>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(msg: String) -> DirResponse {
    DirResponse::Http200(Json(HttpResult::new(msg)))
}
fn make_http_404(msg: String) -> DirResponse {
    DirResponse::Http404(Json(HttpResult::new(msg)))
}
fn make_http_500(msg: String) -> DirResponse {
    DirResponse::Http500(Json(HttpResult::new(msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl DeleteUserApi {
    #[oai(path = "/users/:id", method = "delete")]
    async fn delete_user_api(&self, http_req: &Request, id: Path<String>) -> DirResponse {
        // Package the request parameters.
        let req = ReqDeleteUser {id: id.0};

        // -------------------- Process Request ----------------------
        match self.process(http_req, &req) {
            Ok(r) => r,
            Err(e) => {
                let msg = "ERROR: ".to_owned() + e.to_string().as_str();
                error!("{}", msg);
                make_http_500(msg)
            }
        }
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl DeleteUserApi {
    /// Process the request.
    fn process(&self, http_req: &Request, req: &ReqDeleteUser) -> Result<DirResponse, DirectoryError> {
        // Conditional logging depending on log level.
        dir_utils::debug_request(http_req, req);

        match self.directory.delete(&req.id) {
            Ok(()) => {
                info!("User '{}' deleted.", req.id);
                Ok(make_http_200(DELETED_MSG.to_string()))
            },
            Err(e @ DirectoryError::NotFound(_)) => Ok(make_http_404(e.to_string())),
            Err(e) => Err(e),
        }
    }
}
