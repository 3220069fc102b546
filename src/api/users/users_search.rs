#![forbid(unsafe_code)]

use std::sync::Arc;
use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, param::Query, ApiResponse };
use log::{debug, error};

use crate::utils::errors::HttpResult;
use crate::utils::dir_types::User;
use crate::utils::directory::{UserDirectory, DirectoryError};
use crate::utils::dir_utils::{self, RequestDebug, push_opt_field};

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct SearchUsersApi
{
    directory: Arc<UserDirectory>,
}

impl SearchUsersApi {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self {directory}
    }
}

struct ReqSearchUsers
{
    q: Option<String>,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqSearchUsers {
    type Req = ReqSearchUsers;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request parameters:");
        push_opt_field(&mut s, "q", &self.q);
        s
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
impl SearchUsersApi {
    /// Substring search over name, email, phone and address.  A missing or
    /// empty q returns every user.
    #[oai(path = "/users/search", method = "get")]
    async fn search_users_api(&self, http_req: &Request, q: Query<Option<String>>) -> DirResponse {
        // Package the request parameters.
        let req = ReqSearchUsers {q: q.0};

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
impl SearchUsersApi {
    /// Process the request.
    fn process(&self, http_req: &Request, req: &ReqSearchUsers) -> Result<DirResponse, DirectoryError> {
        // Conditional logging depending on log level.
        dir_utils::debug_request(http_req, req);

        let users = self.directory.search(req.q.as_deref())?;
        debug!("Search for {:?} matched {} user(s).", req.q, users.len());
        Ok(make_http_200(users))
    }
}
