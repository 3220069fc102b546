#![forbid(unsafe_code)]

use std::sync::Arc;
use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, param::Path, ApiResponse };
use log::{error, info};

use crate::utils::errors::HttpResult;
use crate::utils::dir_types::{User, UserInput};
use crate::utils::directory::{UserDirectory, DirectoryError};
use crate::utils::dir_utils::{self, RequestDebug};

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct UpdateUserApi
{
    directory: Arc<UserDirectory>,
}

impl UpdateUserApi {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self {directory}
    }
}

struct ReqUpdateUser
{
    id: String,
    user: UserInput,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqUpdateUser {
    type Req = ReqUpdateUser;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request parameters:");
        s.push_str("\n    id: ");
        s.push_str(&self.id);
        s.push('\n');
        s.push_str(&self.user.get_request_info());
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DirResponse {
    #[oai(status = 200)]
    Http200(Json<User>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 404)]
    Http404(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: User) -> DirResponse {
    DirResponse::Http200(Json(resp))
}
fn make_http_400(msg: String) -> DirResponse {
    DirResponse::Http400(Json(HttpResult::new(msg)))
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
impl UpdateUserApi {
    /// Replace every field of the user.  Fields left out of the body are
    /// removed and the path id always wins over any id in the body.
    #[oai(path = "/users/:id", method = "put")]
    async fn update_user_api(&self, http_req: &Request, id: Path<String>, req: Json<UserInput>) -> DirResponse {
        // Package the request parameters.
        let req = ReqUpdateUser {id: id.0, user: req.0};

        // -------------------- Process Request ----------------------
        match self.process(http_req, req) {
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
impl UpdateUserApi {
    /// Process the request.
    fn process(&self, http_req: &Request, req: ReqUpdateUser) -> Result<DirResponse, DirectoryError> {
        // Conditional logging depending on log level.
        dir_utils::debug_request(http_req, &req);

        match self.directory.update(&req.id, req.user) {
            Ok(u) => {
                info!("User '{}' updated.", u.id);
                Ok(make_http_200(u))
            },
            Err(e @ DirectoryError::NotFound(_)) => Ok(make_http_404(e.to_string())),
            Err(e @ DirectoryError::DuplicateEmail(_)) => {
                error!("Unable to update user '{}': {:?}", req.id, e);
                Ok(make_http_400(e.to_string()))
            },
            Err(e) => Err(e),
        }
    }
}
