mod args;

pub use args::{Cli, LightsailCommand, ProviderCommand};
