use clap::{Parser, Subcommand};

/// Webflow → GitHub relay
#[derive(Parser)]
#[command(name = "relay", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Serve {
        /// Port to bind (defaults to RELAY_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run database migrations and exit
    Migrate,

    /// Manage repository bindings
    Binding {
        #[command(subcommand)]
        command: BindingCommands,
    },
}

#[derive(Subcommand)]
pub enum BindingCommands {
    /// Set the repository, path and branch a user's commits go to
    Set {
        #[arg(long)]
        user_id: String,
        /// Repository as owner/name
        #[arg(long)]
        repository: String,
        #[arg(long)]
        path: String,
        #[arg(long, default_value = "main")]
        branch: String,
    },
    /// Show a user's binding
    Show {
        #[arg(long)]
        user_id: String,
    },
}
