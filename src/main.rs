mod cli;
mod output;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use cli::{Cli, LightsailCommand, ProviderCommand};
use lbattach::{
    AttachmentConfig, AttachmentResource, LoadBalancerApi, OperationHandle, WaitSpec, get_provider,
    wait,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        ProviderCommand::Lightsail { command } => match command {
            LightsailCommand::Attach(args) => {
                let provider = get_provider("lightsail", &args.connection.provider_config())?;
                let resource = AttachmentResource::new(provider.as_ref(), args.wait.wait_spec());
                let config = AttachmentConfig::new(args.load_balancer, args.instances);
                let state = resource.create(&config).await?;
                tracing::info!(load_balancer = %config.load_balancer_name, "attach complete");
                println!("{}", output::attachment_table(state.as_ref()));
            }
            LightsailCommand::Show(args) => {
                let provider = get_provider("lightsail", &args.connection.provider_config())?;
                let info = provider.get_load_balancer(&args.load_balancer).await?;
                println!("{}", output::health_table(&info));
            }
            LightsailCommand::Update(args) => {
                let provider = get_provider("lightsail", &args.connection.provider_config())?;
                let resource = AttachmentResource::new(provider.as_ref(), args.wait.wait_spec());
                let prior = resource
                    .read(&args.load_balancer)
                    .await?
                    .ok_or_else(|| eyre!("no attachment found for '{}'", args.load_balancer))?;
                let desired = AttachmentConfig::new(args.load_balancer, args.instances);
                let state = resource.update(&prior, &desired).await?;
                println!("{}", output::attachment_table(state.as_ref()));
            }
            LightsailCommand::Detach(args) => {
                let provider = get_provider("lightsail", &args.connection.provider_config())?;
                let resource = AttachmentResource::new(provider.as_ref(), args.wait.wait_spec());
                let Some(mut state) = resource.read(&args.load_balancer).await? else {
                    tracing::info!(load_balancer = %args.load_balancer, "nothing attached");
                    return Ok(());
                };
                if !args.instances.is_empty() {
                    state
                        .instance_names
                        .retain(|name| args.instances.contains(name));
                }
                resource.delete(&state).await?;
                let remaining = resource.read(&args.load_balancer).await?;
                println!("{}", output::attachment_table(remaining.as_ref()));
            }
            LightsailCommand::Import(args) => {
                let provider = get_provider("lightsail", &args.connection.provider_config())?;
                let resource = AttachmentResource::new(provider.as_ref(), WaitSpec::default());
                let state = resource
                    .import(&args.load_balancer)
                    .await?
                    .ok_or_else(|| {
                        eyre!("cannot import '{}': no attachment found", args.load_balancer)
                    })?;
                println!("{}", serde_json::to_string_pretty(&state)?);
            }
            LightsailCommand::Wait(args) => {
                let provider = get_provider("lightsail", &args.connection.provider_config())?;
                let handle = OperationHandle::new(args.operation_id);
                let spec = args.wait.wait_spec();
                tracing::info!(operation = %handle, timeout = ?spec.timeout, "waiting for operation");
                let status = wait(provider.as_ref(), &handle, &spec).await?;
                println!("{}", output::operation_table(&handle, &status));
            }
        },
    }

    Ok(())
}
