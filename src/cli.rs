//! CLI argument parsing for the routing-core binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "routing-core", about = "Multi-tenant field-service routing core")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the NATS message handlers (default if no subcommand given)
    Serve,
    /// Run pending database migrations and exit
    Migrate,
    /// Kept for operability parity with the donor CLI; admin/user management
    /// is owned by the external auth collaborator and this is a no-op here.
    CreateAdmin {
        #[arg(long)]
        email: String,
    },
}
