#![forbid(unsafe_code)]

use std::fmt;
use poem_openapi::{ OpenApi, payload::Json, Object };

/// Build details embedded by build.rs, reported at start-up and by
/// GET /api/version.
#[derive(Object, Debug, Clone)]
pub struct BuildInfo
{
    server_version: String,
    git_branch: String,
    git_commit: String,
    git_dirty: String,
    source_ts: String,
    rustc_version: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            git_branch: env!("GIT_BRANCH").to_string(),
            git_commit: env!("GIT_COMMIT_SHORT").to_string(),
            git_dirty: env!("GIT_DIRTY").to_string(),
            source_ts: env!("SOURCE_TIMESTAMP").to_string(),
            rustc_version: env!("RUSTC_VERSION").to_string(),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "USERDIR={}, BRANCH={}, COMMIT={}, DIRTY={}, SRC_TS={}, RUSTC={}",
               self.server_version, self.git_branch, self.git_commit,
               self.git_dirty, self.source_ts, self.rustc_version)
    }
}

pub struct VersionApi;

#[OpenApi]
impl VersionApi {
    #[oai(path = "/version", method = "get")]
    async fn get_version(&self) -> Json<BuildInfo> {
        Json(BuildInfo::current())
    }
}
