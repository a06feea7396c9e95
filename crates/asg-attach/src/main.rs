//! asg-attach: attach load balancers and target groups to Auto Scaling groups
//!
//! Reads an attachment spec (JSON), reconciles it against AWS and records the
//! resulting identity in a local state file.

use anyhow::{Context, Result};
use asg_attach::aws::{AutoScalingClient, AwsContext};
use asg_attach::defaults::{
    DEFAULT_CREATE_TIMEOUT_SECS, DEFAULT_DELETE_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS,
    DEFAULT_REGION,
};
use asg_attach::{
    ApplyOutcome, AttachmentController, AttachmentSpec, ControllerConfig, ManagedAttachment,
    StateFile,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "asg-attach")]
#[command(about = "Manage Auto Scaling group load balancer and target group attachments")]
#[command(version)]
struct Args {
    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    /// Attach timeout in seconds, including retries
    #[arg(long, global = true, default_value_t = DEFAULT_CREATE_TIMEOUT_SECS)]
    create_timeout: u64,

    /// Detach timeout in seconds, including retries
    #[arg(long, global = true, default_value_t = DEFAULT_DELETE_TIMEOUT_SECS)]
    delete_timeout: u64,

    /// Group lookup timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_READ_TIMEOUT_SECS)]
    read_timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, verify or replace the attachment described by a spec file
    Apply {
        /// Attachment spec (JSON)
        #[arg(long)]
        spec: PathBuf,

        /// State file recording the attachment identity
        #[arg(long)]
        state: PathBuf,
    },

    /// Check that the recorded attachment still exists, forgetting it if not
    Refresh {
        /// State file recording the attachment identity
        #[arg(long)]
        state: PathBuf,
    },

    /// Detach the recorded attachment and remove the state file
    Destroy {
        /// State file recording the attachment identity
        #[arg(long)]
        state: PathBuf,
    },

    /// Validate a spec file without calling AWS
    Check {
        /// Attachment spec (JSON)
        #[arg(long)]
        spec: PathBuf,
    },
}

impl Args {
    fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            create_timeout: Duration::from_secs(self.create_timeout),
            delete_timeout: Duration::from_secs(self.delete_timeout),
            read_timeout: Duration::from_secs(self.read_timeout),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into())
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?)
        .add_directive("aws_sdk_autoscaling=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let config = args.controller_config();
    match args.command {
        Command::Check { spec } => handle_check(&spec),
        Command::Apply { spec, state } => {
            let controller = connect(&args.region, args.aws_profile.as_deref(), config).await;
            handle_apply(&controller, &spec, &state).await
        }
        Command::Refresh { state } => {
            let controller = connect(&args.region, args.aws_profile.as_deref(), config).await;
            handle_refresh(&controller, &state).await
        }
        Command::Destroy { state } => {
            let controller = connect(&args.region, args.aws_profile.as_deref(), config).await;
            handle_destroy(&controller, &state).await
        }
    }
}

/// Load AWS config and build a controller that aborts on Ctrl-C
async fn connect(
    region: &str,
    profile: Option<&str>,
    config: ControllerConfig,
) -> AttachmentController<AutoScalingClient> {
    if let Some(profile) = profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, aborting in-flight calls");
                cancel.cancel();
            }
        });
    }

    let aws = AwsContext::with_profile(region, profile).await;
    AttachmentController::new(AutoScalingClient::from_context(&aws))
        .with_config(config)
        .with_cancellation(cancel)
}

fn handle_check(spec_path: &Path) -> Result<()> {
    let spec = AttachmentSpec::load(spec_path)?;
    let attachment = spec
        .resolve()
        .with_context(|| format!("Invalid attachment spec: {}", spec_path.display()))?;
    println!(
        "{}: {} ({}) -> {}",
        spec_path.display(),
        attachment.kind(),
        attachment.value(),
        attachment.group_name
    );
    Ok(())
}

async fn handle_apply(
    controller: &AttachmentController<AutoScalingClient>,
    spec_path: &Path,
    state_path: &Path,
) -> Result<()> {
    let spec = AttachmentSpec::load(spec_path)?;
    let state_file = StateFile::new(state_path);
    let mut managed = ManagedAttachment::new(controller, state_file.load()?);

    let result = managed.apply(&spec).await;
    // Persist whatever the apply left behind, including tainted attachments
    state_file.store(managed.state())?;

    match result? {
        ApplyOutcome::Created(id) => println!("Created {id}"),
        ApplyOutcome::Unchanged(id) => println!("Unchanged {id}"),
        ApplyOutcome::Recreated(id) => println!("Recreated {id} (previous attachment was removed)"),
        ApplyOutcome::Replaced { old, new } => println!("Replaced {old} with {new}"),
    }
    Ok(())
}

async fn handle_refresh(
    controller: &AttachmentController<AutoScalingClient>,
    state_path: &Path,
) -> Result<()> {
    let state_file = StateFile::new(state_path);
    let Some(state) = state_file.load()? else {
        println!("No attachment recorded in {}", state_path.display());
        return Ok(());
    };

    let id = state.id.clone();
    let mut managed = ManagedAttachment::new(controller, Some(state));
    let present = managed.refresh().await?;
    state_file.store(managed.state())?;

    if present {
        println!("{id} exists");
    } else {
        println!("{id} no longer exists, removed from state");
    }
    Ok(())
}

async fn handle_destroy(
    controller: &AttachmentController<AutoScalingClient>,
    state_path: &Path,
) -> Result<()> {
    let state_file = StateFile::new(state_path);
    let mut managed = ManagedAttachment::new(controller, state_file.load()?);

    match managed.destroy().await? {
        Some(id) => println!("Destroyed {id}"),
        None => println!("No attachment recorded in {}", state_path.display()),
    }
    state_file.clear()?;
    Ok(())
}
