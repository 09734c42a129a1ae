mod affiliation;
mod pipeline;
mod pubmed;
mod report;

pub const USER_AGENT: &str = concat!("pubmed-fetcher/", env!("CARGO_PKG_VERSION"));

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::{debug, error, info};

use pubmed::{PaperSource, PubmedClient};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch PubMed papers for a query and flag authors with company affiliations.
#[derive(Parser, Debug)]
#[command(name = "pubmed-fetcher", version, about)]
struct Cli {
    /// Search query for PubMed (full PubMed query syntax)
    query: String,

    /// Filename to save the results (CSV/JSON)
    #[arg(short, long, default_value = "results.csv")]
    file: PathBuf,

    /// Output format
    #[arg(long, default_value = "csv", value_parser = ["csv", "json"])]
    format: String,

    /// Print debug information
    #[arg(short, long)]
    debug: bool,

    /// Maximum number of ids to request from the search
    #[arg(long)]
    max_results: Option<u32>,

    /// Only keep papers with at least one company-affiliated author
    #[arg(long)]
    company_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let directive = if cli.debug {
        "pubmed_fetcher=debug"
    } else {
        "pubmed_fetcher=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    debug!(query = %cli.query, "fetching data for query");

    let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let client = PubmedClient::from_env(http).with_max_results(cli.max_results);

    let ids = match client.search(&cli.query).await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "search failed");
            println!("Error fetching data from PubMed: {e}");
            return Ok(());
        }
    };

    if ids.is_empty() {
        println!("No papers found for the given query.");
        return Ok(());
    }
    info!(count = ids.len(), "search returned ids");

    let mut rows = pipeline::process_papers(&client, &ids).await;
    if cli.company_only {
        rows.retain(pipeline::ReportRow::has_company_authors);
    }

    if rows.is_empty() {
        println!("No relevant papers with company affiliations found.");
        return Ok(());
    }

    let outcome = report::save_results(&rows, &cli.file, &cli.format)?;
    println!("{outcome}");
    Ok(())
}
