#![forbid(unsafe_code)]

use std::sync::Arc;
use poem::{middleware::Cors, Endpoint, EndpointExt, Route};
use poem_openapi::{OpenApi, OpenApiService};

use crate::api::users::users_create::CreateUserApi;
use crate::api::users::users_delete::DeleteUserApi;
use crate::api::users::users_get::GetUserApi;
use crate::api::users::users_list::ListUsersApi;
use crate::api::users::users_search::SearchUsersApi;
use crate::api::users::users_update::UpdateUserApi;
use crate::api::version::VersionApi;
use crate::utils::directory::UserDirectory;

pub mod users;
pub mod version;

// All directory endpoints live under this prefix.
pub const API_PREFIX: &str = "/api";

// ---------------------------------------------------------------------------
// api_service:
// ---------------------------------------------------------------------------
/** Assemble every endpoint around one shared directory.  The static
 * /users/search path takes priority over /users/:id in poem's router, so
 * the order of the tuple doesn't matter.
 */
pub fn api_service(directory: Arc<UserDirectory>, title: &str, server_url: &str)
-> OpenApiService<impl OpenApi, ()> {
    let endpoints = (
        ListUsersApi::new(directory.clone()),
        SearchUsersApi::new(directory.clone()),
        GetUserApi::new(directory.clone()),
        CreateUserApi::new(directory.clone()),
        UpdateUserApi::new(directory.clone()),
        DeleteUserApi::new(directory),
        VersionApi,
    );
    OpenApiService::new(endpoints, title, env!("CARGO_PKG_VERSION")).server(server_url.to_string())
}

// ---------------------------------------------------------------------------
// make_app:
// ---------------------------------------------------------------------------
/** Build the complete application: the api under /api, the generated
 * openapi documents, the swagger ui and permissive CORS.
 */
pub fn make_app(directory: Arc<UserDirectory>, title: &str, server_url: &str) -> impl Endpoint {
    let api_service = api_service(directory, title, server_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();
    let ui = api_service.swagger_ui();

    Route::new()
        .nest(API_PREFIX, api_service)
        .nest("/", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml)
        .with(Cors::new())
}
