use clap::Parser;

#[derive(Parser)]
#[command(name = "paramsync")]
#[command(version = "0.3.0")]
#[command(about = "Self-tuning maintenance daemon: republishes database parameters into live process configuration")]
pub struct Args {
    /// Path to the bootstrap env file
    #[arg(long, default_value = ".env")]
    pub env_file: String,

    /// Bind address for the HTTP front door
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port for the HTTP front door
    #[arg(long, default_value = "5000")]
    pub port: u16,

    /// Run the maintainer without the HTTP front door
    #[arg(long)]
    pub no_web: bool,
}

/// The socket address the front door binds.
pub fn bind_addr(args: &Args) -> String {
    format!("{}:{}", args.host, args.port)
}
