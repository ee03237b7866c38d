//! Binary entry point for the `occi-storage` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use serde_json::{Value, json};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use occi_storage::{
    ActionOutcome, AdapterError, AttributeMap, OpenStackConfig, OpenStackError, OpenStackPlatform,
    RequestContext, StorageAction, StorageAttributes, StorageBackend, StorageLinkBackend,
    StorageLinkRequest,
};

mod cli;

use cli::{Cli, LinkCommand, StorageCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{message} (HTTP {status})")]
    Adapter { status: u16, message: String },
    #[error("failed to write output: {0}")]
    Output(String),
}

impl From<AdapterError<OpenStackError>> for CliError {
    fn from(value: AdapterError<OpenStackError>) -> Self {
        Self::Adapter {
            status: value.http_status(),
            message: value.to_string(),
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(output) => match write_json(io::stdout(), &output) {
            Ok(()) => 0,
            Err(err) => {
                report_error(&err);
                1
            }
        },
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> Result<Value, CliError> {
    let config = OpenStackConfig::load_without_cli_args()
        .map_err(|err| CliError::Config(err.to_string()))?;
    let tenant = config
        .tenant()
        .map_err(|err| CliError::Config(err.to_string()))?;
    let platform = OpenStackPlatform::new(&config).map_err(|err| match err {
        OpenStackError::Config(message) => CliError::Config(message),
        other => CliError::Config(other.to_string()),
    })?;
    let registry = platform.compute_registry();
    let context = RequestContext::new(&tenant, &registry);

    match cli {
        Cli::Storage(command) => {
            let backend = StorageBackend::new(platform);
            run_storage(command, &backend, &context).await
        }
        Cli::Link(command) => {
            let backend = StorageLinkBackend::new(platform);
            run_link(command, &backend, &context).await
        }
    }
}

async fn run_storage(
    command: StorageCommand,
    backend: &StorageBackend<OpenStackPlatform>,
    context: &RequestContext<'_>,
) -> Result<Value, CliError> {
    match command {
        StorageCommand::Create { size, title } => {
            let attributes = StorageAttributes {
                size: Some(size),
                title,
                ..StorageAttributes::default()
            };
            let entity = backend.create(&attributes, context).await?;
            to_json(&entity)
        }
        StorageCommand::Show { id } => {
            let entity = backend.retrieve(&identified(id), context).await?;
            to_json(&entity)
        }
        StorageCommand::Update { id, title, summary } => {
            let current = backend.retrieve(&identified(id), context).await?;
            let changes = StorageAttributes {
                title,
                summary,
                ..StorageAttributes::default()
            };
            let updated = backend.update(&current.attributes, &changes);
            to_json(&updated)
        }
        StorageCommand::Delete { id } => {
            let attributes = identified(id);
            backend.delete(&attributes, context).await?;
            Ok(json!({ "deleted": attributes.id }))
        }
        StorageCommand::Action {
            id,
            action,
            summary,
        } => {
            let action: StorageAction = action
                .parse()
                .map_err(|err| CliError::from(AdapterError::<OpenStackError>::from(err)))?;
            let mut entity = backend.retrieve(&identified(id), context).await?;
            entity.attributes.summary = summary;
            let outcome = backend
                .action(&entity, action, &AttributeMap::new(), context)
                .await?;
            Ok(match outcome {
                ActionOutcome::Unsupported(action) => {
                    json!({ "action": action, "outcome": "unsupported" })
                }
                ActionOutcome::SnapshotRequested(snapshot) => json!({
                    "action": action,
                    "outcome": "requested",
                    "snapshot": {
                        "volume_id": snapshot.volume_id,
                        "name": snapshot.name,
                        "description": snapshot.description,
                    },
                }),
            })
        }
    }
}

async fn run_link(
    command: LinkCommand,
    backend: &StorageLinkBackend<OpenStackPlatform>,
    context: &RequestContext<'_>,
) -> Result<Value, CliError> {
    match command {
        LinkCommand::Create {
            instance,
            volume,
            device,
        } => {
            let request = StorageLinkRequest::new(instance, volume).device_id(device);
            let link = backend.create(&request, context).await?;
            Ok(json!({
                "location": link.location,
                "attributes": link.to_map(),
                "attached": link.attached,
            }))
        }
        LinkCommand::Delete { instance, volume } => {
            let request = StorageLinkRequest::new(instance, volume);
            backend.delete(&request, context).await?;
            Ok(json!({ "detached": request.volume_id, "instance": request.instance_id }))
        }
    }
}

fn identified(id: String) -> StorageAttributes {
    StorageAttributes {
        id: Some(id),
        ..StorageAttributes::default()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, CliError> {
    serde_json::to_value(value).map_err(|err| CliError::Output(err.to_string()))
}

fn write_json(mut target: impl Write, value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(target, "{rendered}").map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
