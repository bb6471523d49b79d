use anyhow::Context;
use colored::Colorize;

use rested_core::Request;
use rested_server::ServerConfig;

use crate::cli::*;
use crate::demo;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Request(args) => cmd_request(args).await,
        Command::Config(args) => cmd_config(args),
    }
}

/// Load the config file, if any, then apply command-line overrides.
pub fn effective_config(args: &ConfigArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.clone();
    }
    if args.debug {
        config.debug = true;
    }
    if args.compact {
        config.pretty = false;
    }
    if args.no_gzip {
        config.gzip = false;
    }
    if let Some(dir) = &args.static_dir {
        config.static_dir = Some(dir.clone());
    }
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = effective_config(&args.config)?;
    println!(
        "{} Serving demo tree on {} at {}/",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        config.mount_path().cyan()
    );
    demo::server_builder(config).build().serve().await?;
    Ok(())
}

async fn cmd_request(args: RequestArgs) -> anyhow::Result<()> {
    let config = effective_config(&args.config)?;
    let server = demo::server_builder(config).build();

    let path = args.path.trim_start_matches('/').to_string();
    let mut request = Request::new(args.method.to_uppercase(), path);
    if let Some(data) = args.data {
        request = request.with_body(data);
    }

    let response = server.dispatcher().dispatch(request).await;
    let status = response.status.to_string();
    let status = match response.status {
        200..=299 => status.green(),
        400..=499 => status.yellow(),
        _ => status.red(),
    };
    println!("{} {} /{}", status.bold(), args.method.to_uppercase(), args.path.trim_start_matches('/'));

    match (response.body, response.reason) {
        (Some(body), _) => println!("{}", String::from_utf8_lossy(&body)),
        (None, Some(reason)) => println!("{}", reason.dimmed()),
        (None, None) => {}
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = effective_config(&args)?;
    let text = toml::to_string_pretty(&config).context("failed to render configuration")?;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_overrides() {
        let config = effective_config(&ConfigArgs::default()).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = ConfigArgs {
            bind: Some("0.0.0.0:9999".parse().unwrap()),
            prefix: Some("v1".into()),
            debug: true,
            compact: true,
            no_gzip: true,
            static_dir: Some("public".into()),
            ..ConfigArgs::default()
        };
        let config = effective_config(&args).unwrap();
        assert_eq!(config.static_dir.as_deref(), Some(std::path::Path::new("public")));
        assert_eq!(config.bind_addr.port(), 9999);
        assert_eq!(config.mount_path(), "/v1");
        assert!(config.debug);
        assert!(!config.pretty);
        assert!(!config.gzip);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = ConfigArgs { config: Some("/no/such/rested.toml".into()), ..ConfigArgs::default() };
        let err = effective_config(&args).unwrap_err();
        assert!(err.to_string().contains("/no/such/rested.toml"));
    }

    #[test]
    fn cli_parses_request() {
        use clap::Parser;

        let cli = Cli::parse_from(["rested", "request", "get", "/users/1", "--compact"]);
        match cli.command {
            Command::Request(args) => {
                assert_eq!(args.method, "get");
                assert_eq!(args.path, "/users/1");
                assert!(args.config.compact);
                assert!(args.data.is_none());
            }
            _ => panic!("expected request command"),
        }
    }
}
