//! Server configuration from command line flags and environment

use clap::Parser;
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "expertise")]
#[command(about = "Expertise server - expert review of work programs")]
#[command(version)]
pub struct Config {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:expertise.db")]
    pub database_url: String,

    /// Address to listen on
    #[arg(long, env = "EXPERTISE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Size of the database connection pool
    #[arg(long, env = "EXPERTISE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
}
