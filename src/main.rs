use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use spf_builder::spf::{txt_chunks, SpfRecord};
use spf_builder::{
    BuildResult, BuilderConfig, MechanismKind, Qualifier, RecordBuilder, RecordRequest,
};

#[derive(Parser)]
#[command(name = "spfgen")]
#[command(version)]
#[command(about = "Generate and inspect SPF (RFC 7208) TXT records")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a record from mechanism values
    Build(BuildArgs),
    /// Parse an existing record and report its lookups and TXT chunks
    Inspect {
        /// The record text, e.g. "v=spf1 include:_spf.google.com ~all"
        record: String,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Domain the record is published for
    #[arg(short, long, required_unless_present = "request")]
    domain: Option<String>,

    /// Read the whole request from a JSON file instead of flags
    #[arg(long, value_name = "FILE", conflicts_with = "domain")]
    request: Option<PathBuf>,

    /// include: domains
    #[arg(long = "include", value_name = "DOMAIN")]
    includes: Vec<String>,

    /// ip4: addresses or networks
    #[arg(long = "ip4", value_name = "ADDR[/PREFIX]")]
    ip4: Vec<String>,

    /// ip6: addresses or networks
    #[arg(long = "ip6", value_name = "ADDR[/PREFIX]")]
    ip6: Vec<String>,

    /// a: domains
    #[arg(long = "a", value_name = "DOMAIN")]
    a: Vec<String>,

    /// mx: domains
    #[arg(long = "mx", value_name = "DOMAIN")]
    mx: Vec<String>,

    /// exists: domain-specs (macros allowed)
    #[arg(long = "exists", value_name = "DOMAIN_SPEC")]
    exists: Vec<String>,

    /// Redirect target; replaces every other mechanism
    #[arg(long, value_name = "DOMAIN")]
    redirect: Option<String>,

    /// Terminal qualifier: fail, softfail, neutral or pass
    #[arg(short, long)]
    qualifier: Option<Qualifier>,
}

impl BuildArgs {
    fn into_request(self, builder: &RecordBuilder) -> anyhow::Result<RecordRequest> {
        if let Some(path) = &self.request {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read request file {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("invalid request JSON in {}", path.display()))?;
            // A file without a qualifier gets the configured default, not the type default.
            let has_qualifier = value.get("qualifier").is_some();
            let mut request: RecordRequest = serde_json::from_value(value)
                .with_context(|| format!("invalid request JSON in {}", path.display()))?;
            if !has_qualifier {
                request.qualifier = builder.config().default_qualifier;
            }
            return Ok(request);
        }

        let mut request = builder.new_request(self.domain.unwrap_or_default());
        for (kind, values) in [
            (MechanismKind::Include, self.includes),
            (MechanismKind::Ip4, self.ip4),
            (MechanismKind::Ip6, self.ip6),
            (MechanismKind::A, self.a),
            (MechanismKind::Mx, self.mx),
            (MechanismKind::Exists, self.exists),
        ] {
            if !values.is_empty() {
                request = request.with_mechanism(kind, values);
            }
        }
        if let Some(target) = self.redirect {
            request = request.with_redirect(target);
        }
        if let Some(q) = self.qualifier {
            request = request.with_qualifier(q);
        }
        Ok(request)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbosity: u8, configured: &str) {
    let filter = match verbosity {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = BuilderConfig::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, &config.logging.level);
    debug!(?config, "configuration loaded");

    match cli.command {
        Command::Build(args) => {
            let builder = RecordBuilder::new(config);
            let request = args.into_request(&builder)?;
            info!(domain = %request.domain, "building SPF record");
            match builder.build(&request) {
                BuildResult::Record(record) => {
                    println!("{record}");
                    Ok(ExitCode::SUCCESS)
                }
                BuildResult::Errors(errors) => {
                    for error in &errors {
                        eprintln!("{error}");
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Inspect { record } => {
            let parsed = SpfRecord::parse(&record).context("failed to parse SPF record")?;
            for directive in &parsed.directives {
                println!("mechanism: {directive}");
            }
            if let Some(target) = &parsed.redirect {
                println!("redirect: {target}");
            }
            if let Some(exp) = &parsed.explanation {
                println!("exp: {exp}");
            }
            let lookups = parsed.lookup_count();
            println!("dns lookups: {lookups}/{}", config.max_dns_lookups);
            println!("length: {}", record.trim().len());
            for chunk in txt_chunks(record.trim()) {
                println!("txt: \"{chunk}\"");
            }
            if lookups > config.max_dns_lookups {
                eprintln!("warning: record needs {lookups} DNS lookups; the limit is {}", config.max_dns_lookups);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
