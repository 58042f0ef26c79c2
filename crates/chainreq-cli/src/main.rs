//! chainreq command line

use anyhow::{Context, Result};
use chainreq_ledger::{BlockRouter, ConnectionManager, FileKeyStore, KeyStore};
use chainreq_network::{
    Backends, InterceptorAgent, LocalAgent, RequestExecutor, SettingsHandle, StrategySelector,
};
use chainreq_session::{NoopScriptRunner, RequestRunner, Session, SessionStore};
use chainreq_types::{import_contract_abi, ClientConfig, CombinedEnv, RestRequest, RestResponse};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("TOML config file; defaults plus CHAINREQ_* variables when absent");

    Command::new("chainreq")
        .version(env!("CARGO_PKG_VERSION"))
        .about("API client for ledger view calls and signed function calls")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("send")
                .about("Execute a request file and print the response")
                .arg(
                    Arg::new("request")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Request JSON"),
                )
                .arg(config_arg.clone())
                .arg(
                    Arg::new("raw")
                        .long("raw")
                        .action(ArgAction::SetTrue)
                        .help("Print the body as received instead of formatted"),
                ),
        )
        .subcommand(
            Command::new("route")
                .about("Show whether a block height is read live or from the archive")
                .arg(
                    Arg::new("target")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Block height to read at"),
                )
                .arg(
                    Arg::new("observed")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Latest observed block height"),
                )
                .arg(
                    Arg::new("window")
                        .long("window")
                        .value_parser(value_parser!(u64))
                        .help("Retention window in blocks"),
                ),
        )
        .subcommand(
            Command::new("import-abi")
                .about("Convert a contract ABI into a request collection")
                .arg(
                    Arg::new("abi")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("ABI JSON"),
                ),
        )
        .subcommand(
            Command::new("strategy")
                .about("Show which backend requests would use")
                .arg(config_arg),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &ArgMatches) -> Result<ClientConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ClientConfig::default().apply_env_overrides()),
    }
}

async fn agent_for(config: &ClientConfig) -> Result<Arc<LocalAgent>> {
    let agent = LocalAgent::new(
        config.http.agent_url.clone(),
        Duration::from_secs(config.http.timeout_secs),
    )?;
    if config.settings.extensions_enabled {
        agent.probe().await;
    }
    Ok(Arc::new(agent))
}

async fn send(args: &ArgMatches) -> Result<bool> {
    let config = load_config(args)?;
    let path = args
        .get_one::<PathBuf>("request")
        .context("missing request file")?;
    let request = read_request(path)?;

    let key_store: Arc<dyn KeyStore> =
        Arc::new(FileKeyStore::new(config.ledger.credentials_path()));
    let manager = Arc::new(
        ConnectionManager::initialize(config.ledger.clone(), key_store)
            .await
            .context("connecting to the ledger network")?,
    );

    let agent = agent_for(&config).await?;
    let selector = StrategySelector::new(SettingsHandle::new(config.settings), agent.clone());
    let backends = Backends::from_config(&config.http, agent)?;
    let executor = RequestExecutor::from_manager(&manager, selector, backends);

    let store = Arc::new(SessionStore::new(Session {
        request,
        ..Session::default()
    }));
    let runner = RequestRunner::new(store, executor, Arc::new(NoopScriptRunner));
    let response = runner
        .run(CombinedEnv::default())
        .await
        .context("execution was cancelled")?;

    let format = !args.get_flag("raw");
    println!("{}", serde_json::to_string_pretty(&render(&response, format))?);
    Ok(response.is_success())
}

fn read_request(path: &Path) -> Result<RestRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut request: RestRequest = serde_json::from_str(&text)
        .with_context(|| format!("parsing request {}", path.display()))?;
    request.sync_envelope();
    Ok(request)
}

fn render(response: &RestResponse, format: bool) -> serde_json::Value {
    json!({
        "type": response.type_name(),
        "statusCode": response.status_code(),
        "meta": response.meta(),
        "error": response.failure(),
        "body": response.body_text(format),
    })
}

fn route(args: &ArgMatches) -> Result<()> {
    let target = *args.get_one::<u64>("target").context("missing target")?;
    let observed = *args.get_one::<u64>("observed").context("missing observed")?;
    let router = args
        .get_one::<u64>("window")
        .map_or_else(BlockRouter::default, |w| BlockRouter::new(*w));
    println!("{}", router.route(target, observed).as_str());
    Ok(())
}

fn import_abi(args: &ArgMatches) -> Result<()> {
    let path = args.get_one::<PathBuf>("abi").context("missing ABI file")?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let collection = import_contract_abi(&text)?;
    println!("{}", serde_json::to_string_pretty(&collection)?);
    Ok(())
}

async fn strategy(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    let agent = agent_for(&config).await?;
    tracing::debug!(installed = agent.is_installed(), "Interceptor agent");
    let selector = StrategySelector::new(SettingsHandle::new(config.settings), agent);
    println!("{}", selector.select().as_str());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("send", args)) => {
            let success = send(args).await?;
            std::process::exit(if success { 0 } else { 1 });
        }
        Some(("route", args)) => route(args),
        Some(("import-abi", args)) => import_abi(args),
        Some(("strategy", args)) => strategy(args).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn route_arguments_parse() {
        let matches = cli()
            .try_get_matches_from(["chainreq", "route", "100", "172901", "--window", "10"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "route");
        assert_eq!(args.get_one::<u64>("target"), Some(&100));
        assert_eq!(args.get_one::<u64>("window"), Some(&10));
        assert!(route(args).is_ok());
    }

    #[test]
    fn send_requires_a_file() {
        assert!(cli().try_get_matches_from(["chainreq", "send"]).is_err());
    }

    #[test]
    fn failure_renders_without_body() {
        let response = RestResponse::ScriptFail {
            error: chainreq_types::FailureDetail::new(chainreq_types::FailureKind::Script, "boom"),
        };
        let rendered = render(&response, true);
        assert_eq!(rendered["type"], "script_fail");
        assert_eq!(rendered["body"], "");
        assert_eq!(rendered["error"]["message"], "boom");
    }
}
