use std::time::Duration;

use clap::{Parser, Subcommand};

use lbattach::{ProviderConfig, WaitSpec};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: ProviderCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProviderCommand {
    Lightsail {
        #[command(subcommand)]
        command: LightsailCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum LightsailCommand {
    /// Attach instances to a load balancer
    Attach(AttachArgs),
    /// Show the instances attached to a load balancer
    Show(LoadBalancerArgs),
    /// Converge the attached instances to exactly the given set
    Update(AttachArgs),
    /// Detach instances (all of them unless --instance is given)
    Detach(DetachArgs),
    /// Import an existing attachment by load balancer name
    Import(LoadBalancerArgs),
    /// Wait for a single Lightsail operation to finish
    Wait(WaitOperationArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConnectionArgs {
    #[arg(long, env = "AWS_REGION", default_value = lbattach::providers::DEFAULT_REGION)]
    pub region: String,

    /// Override the regional Lightsail endpoint
    #[arg(long, env = "LIGHTSAIL_ENDPOINT")]
    pub endpoint: Option<String>,
}

impl ConnectionArgs {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct WaitArgs {
    #[arg(long, default_value_t = 600)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 3)]
    pub poll_interval_secs: u64,

    #[arg(long, default_value_t = 5)]
    pub delay_secs: u64,
}

impl WaitArgs {
    pub fn wait_spec(&self) -> WaitSpec {
        WaitSpec::default()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_delay(Duration::from_secs(self.delay_secs))
    }
}

#[derive(clap::Args, Debug)]
pub struct LoadBalancerArgs {
    #[arg(long = "load-balancer")]
    pub load_balancer: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(clap::Args, Debug)]
pub struct AttachArgs {
    #[arg(long = "load-balancer")]
    pub load_balancer: String,

    #[arg(long = "instance", required = true)]
    pub instances: Vec<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(clap::Args, Debug)]
pub struct DetachArgs {
    #[arg(long = "load-balancer")]
    pub load_balancer: String,

    #[arg(long = "instance")]
    pub instances: Vec<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(clap::Args, Debug)]
pub struct WaitOperationArgs {
    #[arg(long = "operation-id")]
    pub operation_id: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}
