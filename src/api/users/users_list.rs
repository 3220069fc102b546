#![forbid(unsafe_code)]

use std::sync::Arc;
use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, ApiResponse };
use log::error;

use crate::utils::errors::HttpResult;
use crate::utils::dir_types::User;
use crate::utils::directory::{UserDirectory, DirectoryError};
use crate::utils::dir_utils::{self, RequestDebug};

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct ListUsersApi
{
    directory: Arc<UserDirectory>,
}

impl ListUsersApi {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self {directory}
    }
}

struct ReqListUsers;

impl RequestDebug for ReqListUsers {
    type Req = ReqListUsers;
    fn get_request_info(&self) -> String {
        "  * No Request Body".to_string()
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DirResponse {
    #[oai(status = 200)]
    Http200(Json<Vec<User>>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: Vec<User>) -> DirResponse {
    DirResponse::Http200(Json(resp))
}
fn make_http_500(msg: String) -> DirResponse {
    DirResponse::Http500(Json(HttpResult::new(msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl ListUsersApi {
    #[oai(path = "/users", method = "get")]
    async fn list_users_api(&self, http_req: &Request) -> DirResponse {
        match self.process(http_req, &ReqListUsers) {
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
impl ListUsersApi {
    /// Process the request.
    fn process(&self, http_req: &Request, req: &ReqListUsers) -> Result<DirResponse, DirectoryError> {
        // Conditional logging depending on log level.
        dir_utils::debug_request(http_req, req);

        let users = self.directory.list()?;
        Ok(make_http_200(users))
    }
}
