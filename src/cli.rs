use crate::error::Result;
use crate::fetch::{fetch_with_options, FetchOptions};
use crate::pool::CertPool;
use crate::report::{render_report, RenderOptions};
use crate::verify::{ChainVerifier, VerifyOptions};
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

pub const USAGE: &str = "usage: chaincheck <HOSTNAME> <PORT>";

#[derive(Parser, Debug)]
#[command(name = "chaincheck")]
#[command(version, about = "Fetch a server's certificate chain and verify it independently", long_about = None)]
pub struct Cli {
    #[arg(help = "Server host name, also used for SNI and the leaf name check")]
    pub hostname: String,

    #[arg(help = "Server port")]
    pub port: u16,

    #[arg(short, long, default_value = "5", help = "Connection timeout in seconds")]
    pub timeout: u64,

    #[arg(long, help = "PEM bundle to trust instead of the system store")]
    pub ca_file: Option<PathBuf>,

    #[arg(long, help = "Leave PEM blocks out of the listing")]
    pub no_pem: bool,
}

/// Exit status for malformed arguments.
pub const USAGE_EXIT_CODE: i32 = 2;

/// What the command line asks for.
#[derive(Debug)]
pub enum Invocation {
    Run(Cli),
    /// `--help` or `--version`; clap renders and exits successfully.
    Info(clap::Error),
    /// Anything malformed; answered with the one-line usage.
    Usage,
}

impl Invocation {
    /// Line printed to stderr before exiting, if any.
    pub fn usage_line(&self) -> Option<&'static str> {
        match self {
            Invocation::Usage => Some(USAGE),
            _ => None,
        }
    }
}

pub fn parse_from<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::Run(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Invocation::Info(e)
        }
        Err(e) => {
            log::debug!("Rejected arguments: {}", e.kind());
            Invocation::Usage
        }
    }
}

/// Parse the process arguments, exiting on help, version or misuse.
pub fn parse_args() -> Cli {
    match parse_from(std::env::args_os()) {
        Invocation::Run(cli) => cli,
        Invocation::Info(e) => e.exit(),
        Invocation::Usage => {
            eprintln!("{}", USAGE);
            std::process::exit(USAGE_EXIT_CODE);
        }
    }
}

pub fn run_cli() -> Result<()> {
    let cli = parse_args();
    run(&cli)
}

pub fn run(cli: &Cli) -> Result<()> {
    let store = match &cli.ca_file {
        Some(path) => {
            log::info!("Using trust anchors from {}", path.display());
            CertPool::from_pem_file(path)?
        }
        None => CertPool::system()?,
    };

    println!(
        "{}",
        format!("Fetching certificate chain from {}:{}...", cli.hostname, cli.port).cyan()
    );

    let fetch_options = FetchOptions {
        timeout: Duration::from_secs(cli.timeout),
    };
    let chain = fetch_with_options(&cli.hostname, cli.port, &fetch_options)?;

    let verifier = ChainVerifier::new(&store, VerifyOptions::for_host(cli.hostname.as_str()));
    let report = verifier.verify(&chain);

    let render_options = RenderOptions {
        include_pem: !cli.no_pem,
    };
    print!("{}", render_report(&chain, &report, &render_options));

    Ok(())
}
