//! framed-mcp server entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use framed_mcp::config::{resolve_log_filter, ServerConfig};
use framed_mcp::protocol::ProtocolHandler;
use framed_mcp::tools::ToolRegistry;
use framed_mcp::transport::{SessionEnd, StdioTransport};
use framed_mcp::types::InitializeResult;

#[derive(Parser)]
#[command(
    name = "framed-mcp",
    about = "MCP server speaking Content-Length framed JSON-RPC over stdio",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Also reads FRAMED_MCP_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Largest accepted frame body in bytes. Also reads FRAMED_MCP_MAX_FRAME_BYTES.
    #[arg(long, global = true)]
    max_frame_bytes: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   framed-mcp completions bash > ~/.local/share/bash-completion/completions/framed-mcp
    ///   framed-mcp completions zsh > ~/.zfunc/_framed-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(resolve_log_filter(cli.log_level.as_deref()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = ServerConfig::resolve(cli.max_frame_bytes)?;
            tracing::info!(
                "{} v{} (max frame {} bytes)",
                config.server_info.name,
                config.server_info.version,
                config.max_frame_len
            );

            let handler =
                ProtocolHandler::with_server_info(ToolRegistry::with_builtin_tools(), config.server_info);
            let mut transport = StdioTransport::new(handler).with_max_frame_len(config.max_frame_len);

            match transport.run()? {
                SessionEnd::EndOfStream | SessionEnd::EmptyFrame => tracing::info!("Session ended"),
                SessionEnd::MalformedFrame(e) => tracing::warn!("Session ended on malformed frame: {e}"),
            }
        }

        Commands::Info => {
            let capabilities = InitializeResult::default_result();
            let tools = ToolRegistry::with_builtin_tools().list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "framed-mcp", &mut std::io::stdout());
        }

        Commands::Repl => {
            let config = ServerConfig::resolve(cli.max_frame_bytes)?;
            framed_mcp::repl::run(config)?;
        }
    }

    Ok(())
}
