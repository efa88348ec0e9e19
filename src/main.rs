//! Composito application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Open the SQLite pool and apply migrations
//! 3. Build router with auth + API routes and the session resolver
//! 4. Start Axum server
//!
//! Also supports provisioning subcommands:
//! - `hash-password <password>` prints a credential hash
//! - `create-user <email> <password> [role]` inserts a user

use composito::{
    auth::{hash_password, AppState},
    config::Config,
    models::Role,
    routes, storage,
};
use std::sync::Arc;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  composito                                      Run the server");
    eprintln!("  composito hash-password <password>             Print a password hash");
    eprintln!("  composito create-user <email> <password> [role]");
    eprintln!();
    eprintln!("Roles: tc_member, subcommittee, public (default)");
}

/// Insert a user into the configured database.
async fn create_user(email: &str, password: &str, role: Option<&str>) -> Result<String, String> {
    let role = match role {
        Some(r) => r.parse::<Role>()?,
        None => Role::default(),
    };

    if email.trim().is_empty() || password.is_empty() {
        return Err("Email and password required".to_string());
    }

    let config = Config::from_env().map_err(|e| e.to_string())?;
    let pool = storage::connect(&config.database_url, config.database_max_connections)
        .await
        .map_err(|e| e.to_string())?;
    storage::migrate(&pool).await.map_err(|e| e.to_string())?;

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| e.to_string())?;

    let user = storage::user::create_user(&pool, email, &password_hash, role)
        .await
        .map_err(|e| e.to_string())?;

    Ok(format!("Created user {} ({}) with role {}", user.id, user.email, user.role))
}

#[tokio::main]
async fn main() {
    // Check for provisioning subcommands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => {}
        Some("hash-password") => {
            if args.len() != 3 {
                print_usage();
                std::process::exit(1);
            }
            println!("{}", hash_password(&args[2]));
            return;
        }
        Some("create-user") => {
            if args.len() != 4 && args.len() != 5 {
                print_usage();
                std::process::exit(1);
            }
            match create_user(&args[2], &args[3], args.get(4).map(String::as_str)).await {
                Ok(message) => println!("{}", message),
                Err(e) => {
                    eprintln!("Error creating user: {}", e);
                    std::process::exit(1);
                }
            }
            return;
        }
        Some(_) => {
            print_usage();
            std::process::exit(1);
        }
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!(?config, "Starting composito on {}", config.bind_addr);

    // Open database and bring the schema up to date
    let db = storage::connect(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to open database");
    storage::migrate(&db).await.expect("Failed to run migrations");

    let bind_addr = config.bind_addr;
    let state = AppState {
        db,
        config: Arc::new(config),
    };

    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
