#![forbid(unsafe_code)]

use std::sync::Arc;
use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, ApiResponse };
use log::{error, info};

use crate::utils::errors::HttpResult;
use crate::utils::dir_types::{User, UserInput};
use crate::utils::directory::{UserDirectory, DirectoryError};
use crate::utils::dir_utils::{self, RequestDebug, push_opt_field};

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct CreateUserApi
{
    directory: Arc<UserDirectory>,
}

impl CreateUserApi {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self {directory}
    }
}

// Implement the debug record trait for logging.
impl RequestDebug for UserInput {
    type Req = UserInput;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        push_opt_field(&mut s, "name", &self.name);
        push_opt_field(&mut s, "email", &self.email);
        push_opt_field(&mut s, "phone", &self.phone);
        push_opt_field(&mut s, "age", &self.age);
        push_opt_field(&mut s, "gender", &self.gender);
        push_opt_field(&mut s, "address", &self.address);
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum DirResponse {
    #[oai(status = 201)]
    Http201(Json<User>),
    #[oai(status = 400)]
    Http400(Json<HttpResult>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_201(resp: User) -> DirResponse {
    DirResponse::Http201(Json(resp))
}
fn make_http_400(msg: String) -> DirResponse {
    DirResponse::Http400(Json(HttpResult::new(msg)))
}
fn make_http_500(msg: String) -> DirResponse {
    DirResponse::Http500(Json(HttpResult::new(msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl CreateUserApi {
    #[oai(path = "/users", method = "post")]
    async fn create_user_api(&self, http_req: &Request, req: Json<UserInput>) -> DirResponse {
        // -------------------- Process Request ----------------------
        match self.process(http_req, req.0) {
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
impl CreateUserApi {
    /// Process the request.
    fn process(&self, http_req: &Request, req: UserInput) -> Result<DirResponse, DirectoryError> {
        // Conditional logging depending on log level.
        dir_utils::debug_request(http_req, &req);

        // The directory assigns the id.
        match self.directory.create(req) {
            Ok(u) => {
                info!("New user '{}' created with email {:?}.", u.id, u.email);
                Ok(make_http_201(u))
            },
            Err(e @ DirectoryError::DuplicateEmail(_)) => {
                error!("Unable to create user: {:?}", e);
                Ok(make_http_400(e.to_string()))
            },
            Err(e) => Err(e),
        }
    }
}
