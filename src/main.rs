//! `etendo-tools` command line
//!
//! Lists, describes and invokes the Etendo copilot tools. `invoke` prints the
//! tool envelope as JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use etendo_tools::context::{RequestContext, ETENDO_TOKEN};
use etendo_tools::error::{CopilotError, CopilotResult};
use etendo_tools::llm::{LlmProvider, OpenAiConfig, OpenAiProvider};
use etendo_tools::observability::init_default_logging;
use etendo_tools::tools::builtin::OPENAPI_ETENDO;
use etendo_tools::{CopilotConfig, ToolSystem};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info};

/// Copilot tool adapters for the Etendo ERP
#[derive(Parser)]
#[command(name = "etendo-tools")]
#[command(about = "Copilot tool adapters for the Etendo ERP")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered tools
    List,
    /// Print a tool's description and parameter schema
    Describe {
        /// Tool name
        tool: String,
    },
    /// Invoke a tool and print its envelope
    Invoke {
        /// Tool name
        tool: String,
        /// Tool parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
        /// Etendo access token
        #[arg(long, env = "ETENDO_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Extra request context as JSON (for example `{"auth": {...}}`)
        #[arg(long)]
        context: Option<String>,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::List => list_tools(&config).await,
        Commands::Describe { tool } => describe_tool(&config, &tool).await,
        Commands::Invoke {
            tool,
            params,
            token,
            context,
        } => invoke_tool(&config, &tool, &params, token, context.as_deref()).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        eprintln!("{e}");
        process::exit(e.exit_code());
    }
}

fn load_configuration(config_path: Option<&Path>) -> CopilotResult<CopilotConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(CopilotConfig::load_from_file(path)?);
    }

    for path_str in ["etendo-tools.toml", "config/etendo-tools.toml"] {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(CopilotConfig::load_from_file(path)?);
        }
    }

    info!("No configuration file found, using defaults and environment");
    Ok(CopilotConfig::from_env()?)
}

/// Only the API agent needs a language model
fn create_provider(config: &CopilotConfig) -> CopilotResult<Option<Arc<dyn LlmProvider>>> {
    if !config.tools.contains_key(OPENAPI_ETENDO) {
        return Ok(None);
    }

    let provider = OpenAiProvider::new(openai_config(config, config.get_llm_api_key()?))?;
    Ok(Some(Arc::new(provider)))
}

/// Provider settings taken from the agent section and the shared HTTP timeout
fn openai_config(config: &CopilotConfig, api_key: String) -> OpenAiConfig {
    OpenAiConfig {
        api_key,
        base_url: config.openapi_agent.base_url.clone(),
        timeout: config.http_timeout(),
    }
}

async fn build_tool_system(config: &CopilotConfig) -> CopilotResult<ToolSystem> {
    let llm = create_provider(config)?;
    Ok(ToolSystem::from_config(config, llm).await?)
}

async fn list_tools(config: &CopilotConfig) -> CopilotResult<()> {
    let tools = build_tool_system(config).await?;
    for name in tools.list_tools() {
        println!("{name}");
    }
    Ok(())
}

async fn describe_tool(config: &CopilotConfig, tool: &str) -> CopilotResult<()> {
    let tools = build_tool_system(config).await?;
    let description = tools
        .describe_tool(tool)
        .ok_or_else(|| CopilotError::invalid_input(format!("Unknown tool: {tool}")))?;

    let output = json!({
        "name": description.name,
        "description": description.description,
        "parameters": description.parameters,
    });
    println!("{}", pretty(&output));
    Ok(())
}

async fn invoke_tool(
    config: &CopilotConfig,
    tool: &str,
    params: &str,
    token: Option<String>,
    context: Option<&str>,
) -> CopilotResult<()> {
    let parameters: Value = serde_json::from_str(params)
        .map_err(|e| CopilotError::invalid_input(format!("--params is not valid JSON: {e}")))?;
    let context = build_context(context, token)?;

    let tools = build_tool_system(config).await?;
    info!(tool, request_id = %context.request_id(), "Invoking tool");

    // Error envelopes are values, not failures of the command
    let envelope = tools.invoke(tool, &parameters, &context).await;
    println!("{}", pretty(&envelope.into_value()));
    Ok(())
}

/// Merge `--context` and `--token` into a request context (pure function)
fn build_context(context: Option<&str>, token: Option<String>) -> CopilotResult<RequestContext> {
    let mut extra_info = match context {
        Some(raw) => serde_json::from_str::<Value>(raw).map_err(|e| {
            CopilotError::invalid_input(format!("--context is not valid JSON: {e}"))
        })?,
        None => json!({}),
    };

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let extra = extra_info.as_object_mut().ok_or_else(|| {
            CopilotError::invalid_input("--context must be a JSON object")
        })?;
        let auth = extra.entry("auth").or_insert_with(|| json!({}));
        match auth.as_object_mut() {
            Some(auth) => {
                auth.insert(ETENDO_TOKEN.to_string(), Value::String(token));
            }
            None => return Err(CopilotError::invalid_input("context 'auth' must be an object")),
        }
    }

    Ok(RequestContext::new(extra_info))
}

fn handle_config_command(config: &CopilotConfig, show: bool) -> CopilotResult<()> {
    if show {
        let rendered = toml::to_string_pretty(config)
            .map_err(|e| CopilotError::invalid_input(e.to_string()))?;
        println!("{rendered}");
    }

    info!("Configuration validation complete");
    Ok(())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
