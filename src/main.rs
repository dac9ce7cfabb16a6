use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use strider::{
    Args, DispatchError, Handler, Member, Param, RouteTable,
    config::{ServerConfig, ServerConfigValidator, load_config},
    render, tracing_setup,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML, YAML or JSON). Defaults apply when omitted.
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// Override the configured port
    #[clap(short, long, global = true)]
    port: Option<u16>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration and exit
    Validate,
    /// Start the hello application (default)
    Serve,
}

/// The bundled demo application.
struct HelloWorld;

impl HelloWorld {
    fn hello(&self, args: &Args) -> Result<String, DispatchError> {
        Ok(format!("Hello, {}!", args.require("name")?))
    }
}

impl Handler for HelloWorld {
    fn routes(table: &mut RouteTable<Self>) {
        table.member(
            Member::method("hello", render::plaintext(HelloWorld::hello))
                .traversable()
                .as_default()
                .param(Param::optional("name").with_default("world")),
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load initial config from {path}"),
        None => "Failed to load config from environment".to_string(),
    })?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Validate => validate_config_command(&config),
        Commands::Serve => {
            ServerConfigValidator::validate(&config)
                .map_err(|e| eyre!("Invalid configuration: {e}"))?;
            tracing_setup::init_tracing_with_config(&config.logging.level, config.logging.json)
                .map_err(|e| eyre!("Failed to initialize tracing: {e}"))?;

            println!("Strider listening on {}", config.listen_addr());
            strider::serve(HelloWorld, config).await
        }
    }
}

fn validate_config_command(config: &ServerConfig) -> Result<()> {
    match ServerConfigValidator::validate(config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr());
            println!("   • Debug: {}", config.debug);
            println!("   • Max Traversal Depth: {}", config.dispatch.max_depth);
            println!("   • Max Form Body: {} bytes", config.request.max_form_bytes);
            println!(
                "   • Logging: {} ({})",
                config.logging.level,
                if config.logging.json { "json" } else { "pretty" }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
