#![forbid(unsafe_code)]

use std::sync::Arc;
use lazy_static::lazy_static;
use log::{error, info};
use poem::listener::{BoxListener, Listener, RustlsCertificate, RustlsConfig, TcpListener};

// UserDir Utilities
use crate::api::{make_app, API_PREFIX};
use crate::api::version::BuildInfo;
use crate::utils::config::{init_log, init_runtime_context, RuntimeCtx, DIR_ARGS, DIR_DIRS, TLS_CERT_FILE, TLS_KEY_FILE};
use crate::utils::directory::UserDirectory;
use crate::utils::errors::Errors;

// Modules
mod api;
mod utils;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "UserDirServer"; // for poem logging

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the parameters variable so that is has a 'static lifetime.
// We exit if we can't read our parameters.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // --------------- Initialize Server --------------
    // Announce ourselves.
    println!("Starting userdir_server!");

    // Just create the data directories if requested.
    if DIR_ARGS.create_dirs_only {
        println!("Data directories created under {}.", DIR_DIRS.root_dir);
        return Ok(());
    }

    // Initialize logging and configuration.
    server_init();

    // The directory is the only owner of user records.
    let config = &RUNTIME_CTX.parms.config;
    let directory = if config.seed_users {
        Arc::new(UserDirectory::with_seed_users())
    } else {
        Arc::new(UserDirectory::new())
    };

    // --------------- Main Loop Set Up ---------------
    // Assign base URL.
    let server_url = format!("{}:{}{}", config.http_addr, config.http_port, API_PREFIX);
    let app = make_app(directory, &config.title, &server_url);

    // Create the listener and run the server.
    let addr = format!("{}{}", "0.0.0.0:", config.http_port);
    let listener = match make_listener(addr, config.enable_tls) {
        Ok(l) => l,
        Err(e) => {
            error!("{}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };
    info!("{} listening on port {} (tls={}).", SERVER_NAME, config.http_port, config.enable_tls);

    // ------------------ Main Loop -------------------
    poem::Server::new(listener)
        .name(SERVER_NAME)
        .run(app)
        .await
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// server_init:
// ---------------------------------------------------------------------------
/** Initialize all subsystems other than those needed to configure the main
 * loop processor.
 */
fn server_init() {
    // Configure out log.
    init_log();

    // Force the reading of input parameters and initialization of runtime context.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));
    if RUNTIME_CTX.parms.config_file.is_empty() {
        info!("No configuration file found, using defaults.");
    } else {
        info!("Configuration read from {}.", RUNTIME_CTX.parms.config_file);
    }
    info!("Data directories: root={}, config={}, logs={}, certs={}.",
          DIR_DIRS.root_dir, DIR_DIRS.config_dir, DIR_DIRS.logs_dir, DIR_DIRS.certs_dir);

    // Log build info.
    info!("\n*** Running {}.", BuildInfo::current());
}

// ---------------------------------------------------------------------------
// make_listener:
// ---------------------------------------------------------------------------
/** Bind a plain tcp listener, or a rustls listener using the key and
 * certificate in the certs directory.
 */
fn make_listener(addr: String, enable_tls: bool) -> Result<BoxListener, Errors> {
    if !enable_tls {
        return Ok(TcpListener::bind(addr).boxed());
    }

    let key_file = DIR_DIRS.certs_dir.clone() + TLS_KEY_FILE;
    let cert_file = DIR_DIRS.certs_dir.clone() + TLS_CERT_FILE;
    let key = std::fs::read(&key_file).map_err(|e| Errors::TLSFileError(format!("{}: {}", key_file, e)))?;
    let cert = std::fs::read(&cert_file).map_err(|e| Errors::TLSFileError(format!("{}: {}", cert_file, e)))?;

    Ok(TcpListener::bind(addr)
        .rustls(RustlsConfig::new().fallback(RustlsCertificate::new().key(key).cert(cert)))
        .boxed())
}
