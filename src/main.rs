//! AutoShop Booking - appointment backend for an auto-service shop.
//!
//! This binary provisions the backing AWS resources and starts the
//! HTTP server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autoshop_booking::{
    config::{CheckConfig, Cli, Command, ProvisionConfig, ServeConfig},
    server::{create_router, AppState, RouterConfig},
    AwsClients, CognitoIdentityProvider, DynamoAppointmentStore, ProvisionedResources,
    Provisioner, S3UploadIssuer,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Provision(config) => run_provision(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  Region: {}", config.aws.aws_region);
    if let Some(ref endpoint) = config.aws.aws_endpoint {
        info!("  Endpoint: {}", endpoint);
    }
    info!("  Bucket: {}", config.aws.bucket);
    info!("  User pool: {}", config.aws.user_pool);
    info!("  Table: {}", config.aws.table);
    info!(
        "  Validation: {}",
        if config.strict_validation {
            "strict"
        } else {
            "discrete slots"
        }
    );
    if config.auto_confirm_users {
        warn!("  Auto-confirm: ON - signups skip email verification");
        warn!("                Disable for production deployments");
    }

    // Create AWS clients
    let clients = AwsClients::connect(
        &config.aws.aws_region,
        config.aws.aws_endpoint.as_deref(),
        config.call_timeout(),
    )
    .await;

    // Ensure backing resources exist
    let provisioner = Provisioner::new(&clients, config.aws.provision_spec());
    let resolved = if config.skip_provision {
        info!("");
        info!("Skipping provisioning; resolving configured resource names");
        resolve_without_provisioning(&provisioner, &config).await
    } else {
        info!("");
        info!("Provisioning backing resources...");
        provisioner.ensure_all().await
    };

    let resources = match resolved {
        Ok(resources) => resources,
        Err(e) => {
            error!("  Resource resolution failed: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - Your AWS credentials are configured correctly");
            error!("    - The credentials may create/read S3, Cognito, and DynamoDB resources");
            error!("    - The endpoint is correct (if using LocalStack)");
            return ExitCode::FAILURE;
        }
    };

    let Some(resources) = check_resources(resources) else {
        return ExitCode::FAILURE;
    };

    info!("  Bucket: {}", resources.bucket);
    info!("  User pool id: {}", resources.user_pool_id);
    info!("  App client id: {}", resources.app_client_id);
    info!("  Table: {}", resources.table);

    // Build the collaborators from the resolved resources
    let identity = CognitoIdentityProvider::new(
        clients.cognito.clone(),
        resources.user_pool_id.clone(),
        resources.app_client_id.clone(),
        config.auto_confirm_users,
    );
    let store = DynamoAppointmentStore::new(clients.dynamodb.clone(), resources.table.clone());
    let uploader = S3UploadIssuer::new(
        clients.s3.clone(),
        resources.bucket.clone(),
        config.aws.aws_region.clone(),
        config.aws.aws_endpoint.clone(),
        config.upload_ttl(),
    );

    let state = AppState::new(identity, store, uploader, config.slot_validator());

    // Build router configuration
    let mut router_config = RouterConfig::new().with_tracing(!config.no_tracing);
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }
    if let Some(assets) = config.assets_dir() {
        router_config = router_config.with_assets_dir(assets);
    }

    let router = create_router(state, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -X POST http://{}/api/auth/signup -H 'Content-Type: application/json' \\",
        addr
    );
    info!("         -d '{{\"email\": \"you@example.com\", \"password\": \"...\"}}'");
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Resolve pool and client ids by name without creating anything.
async fn resolve_without_provisioning(
    provisioner: &Provisioner<'_>,
    config: &ServeConfig,
) -> Result<ProvisionedResources, autoshop_booking::ProvisionError> {
    let user_pool_id = provisioner.find_user_pool().await?.unwrap_or_default();
    let app_client_id = if user_pool_id.is_empty() {
        String::new()
    } else {
        provisioner
            .find_app_client(&user_pool_id)
            .await?
            .unwrap_or_default()
    };

    Ok(ProvisionedResources {
        bucket: config.aws.bucket.clone(),
        user_pool_id,
        app_client_id,
        table: config.aws.table.clone(),
    })
}

/// Reject startup when identity resolution came back empty.
fn check_resources(resources: ProvisionedResources) -> Option<ProvisionedResources> {
    if resources.user_pool_id.is_empty() || resources.app_client_id.is_empty() {
        error!("Could not resolve the user pool or app client");
        error!("Run 'autoshop-booking provision' or check credentials with 'autoshop-booking check'");
        return None;
    }
    Some(resources)
}

// =============================================================================
// Provision Command
// =============================================================================

async fn run_provision(config: ProvisionConfig) -> ExitCode {
    init_logging(config.verbose);

    let clients = AwsClients::connect(
        &config.aws.aws_region,
        config.aws.aws_endpoint.as_deref(),
        config.call_timeout(),
    )
    .await;

    let provisioner = Provisioner::new(&clients, config.aws.provision_spec());

    match provisioner.ensure_all().await {
        Ok(resources) => {
            println!("Provisioned resources:");
            println!("  bucket:        {}", resources.bucket);
            println!("  user pool id:  {}", resources.user_pool_id);
            println!("  app client id: {}", resources.app_client_id);
            println!("  table:         {}", resources.table);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Provisioning failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("AutoShop Booking Configuration Check");
    println!("════════════════════════════════════");
    println!();
    println!("✓ Region: {}", config.aws.aws_region);
    if let Some(ref endpoint) = config.aws.aws_endpoint {
        println!("✓ Endpoint: {}", endpoint);
    }
    println!();

    let clients = AwsClients::connect(
        &config.aws.aws_region,
        config.aws.aws_endpoint.as_deref(),
        config.call_timeout(),
    )
    .await;

    let mut failures = 0;

    // Credentials / bucket
    print!("Checking bucket '{}'... ", config.aws.bucket);
    match clients.s3.head_bucket().bucket(&config.aws.bucket).send().await {
        Ok(_) => println!("✓ reachable"),
        Err(e) => {
            failures += 1;
            if e.as_service_error().map(|se| se.is_not_found()).unwrap_or(false) {
                println!("✗ not found (run 'autoshop-booking provision')");
            } else {
                println!("✗ failed: {}", e);
            }
        }
    }

    // User pool
    print!("Checking user pool '{}'... ", config.aws.user_pool);
    match clients.cognito.list_user_pools().max_results(60).send().await {
        Ok(pools) => {
            let found = pools
                .user_pools()
                .iter()
                .any(|pool| pool.name() == Some(config.aws.user_pool.as_str()));
            if found {
                println!("✓ exists");
            } else {
                failures += 1;
                println!("✗ not found (run 'autoshop-booking provision')");
            }
        }
        Err(e) => {
            failures += 1;
            println!("✗ failed: {}", e);
        }
    }

    // Table
    print!("Checking table '{}'... ", config.aws.table);
    match clients
        .dynamodb
        .describe_table()
        .table_name(&config.aws.table)
        .send()
        .await
    {
        Ok(_) => println!("✓ exists"),
        Err(e) => {
            failures += 1;
            let not_found = e
                .as_service_error()
                .map(|se| se.is_resource_not_found_exception())
                .unwrap_or(false);
            if not_found {
                println!("✗ not found (run 'autoshop-booking provision')");
            } else {
                println!("✗ failed: {}", e);
            }
        }
    }

    println!();
    println!("════════════════════════════════════");
    if failures == 0 {
        println!("✓ All checks passed!");
        ExitCode::SUCCESS
    } else {
        println!("✗ {} check(s) failed", failures);
        ExitCode::FAILURE
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "autoshop_booking=debug,tower_http=debug"
    } else {
        "autoshop_booking=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
