//! `oca`: command-line entry point.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ocaportal::charts::build_profile_charts;
use ocaportal::filters::FilterMap;
use ocaportal::indicators::{load_indicator_charts, IndicatorQuery};
use ocaportal::journal::{JournalProfileState, ProfileSummary};
use ocaportal::labels::LabelStandardizer;
use ocaportal::results::DataSourceKind;
use ocaportal::{load_settings, PortalClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "OCA indicators portal rendering pipeline", long_about = None)]
struct Cli {
    /// Portal base URL (overrides config)
    #[arg(long, global = true, env = "OCA_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve chart options, filter panels and results over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Build the indicators page charts for a filter set and print them as JSON
    Chart {
        #[arg(long)]
        data_source: Option<String>,
        #[arg(long, default_value = "document")]
        study_unit: String,
        /// Breakdown variable, e.g. `country`
        #[arg(long)]
        breakdown: Option<String>,
        /// Filter as `key=value`; repeat for several values
        #[arg(long = "filter", value_parser = parse_pair)]
        filters: Vec<(String, String)>,
        /// Chart container width in pixels
        #[arg(long)]
        width: Option<u32>,
    },
    /// Run a search and print the result list HTML
    Search {
        #[arg(long)]
        index: Option<String>,
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long = "filter", value_parser = parse_pair)]
        filters: Vec<(String, String)>,
    },
    /// Print the journal profile summary and charts as JSON
    Journal {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        issn: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        category_level: Option<String>,
        #[arg(long)]
        year: Option<String>,
    },
    /// Print the filter option catalogue of a data source as JSON
    Filters {
        #[arg(long)]
        data_source: Option<String>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ocaportal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings().await;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url.trim_end_matches('/').to_string();
    }

    match cli.command {
        Command::Serve { host, port } => {
            if let Err(e) = settings.ensure_directories() {
                tracing::warn!("Could not create {}: {}", settings.data_dir.display(), e);
            }
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);
            ocaportal::server::serve(&settings, &host, port).await?;
        }
        Command::Chart {
            data_source,
            study_unit,
            breakdown,
            filters,
            width,
        } => {
            let client = PortalClient::new(&settings)?;
            let mut map = FilterMap::from_pairs(filters);
            map.insert("study_unit", study_unit);
            if let Some(breakdown) = breakdown {
                map.insert("breakdown_variable", breakdown);
            }
            let query = IndicatorQuery {
                data_source: data_source.unwrap_or_else(|| settings.default_data_source.clone()),
                filters: map,
                breakdown_label: None,
                width_px: Some(width.unwrap_or(settings.chart_width_px)),
            };
            let page = load_indicator_charts(&client, &LabelStandardizer::default(), &query)
                .await
                .context("Error loading indicator data.")?;
            print_json(&page)?;
        }
        Command::Search {
            index,
            query,
            filters,
        } => {
            let client = PortalClient::new(&settings)?;
            let index = index.unwrap_or_else(|| settings.default_data_source.clone());
            let mut params = Vec::new();
            if !query.trim().is_empty() {
                params.push(("search".to_string(), query.trim().to_string()));
            }
            params.push(("index_name".to_string(), index.clone()));
            params.extend(filters);

            let response = client.search_results(&params).await?;
            info!("{} results", response.total_results);
            println!("{}", response.to_html(DataSourceKind::from_index(&index)));
        }
        Command::Journal {
            title,
            issn,
            category,
            category_level,
            year,
        } => {
            if title.trim().is_empty() {
                bail!("--title must not be empty");
            }
            let client = PortalClient::new(&settings)?;
            let mut state = JournalProfileState::default();
            state.select_journal(&title, &issn, category_level.as_deref());
            if let Some(category) = category {
                state.select_category(&category, None);
            }
            if let Some(year) = year {
                state.select_year(&year);
            }
            let payload = client.journal_timeseries(&state).await?;
            print_json(&serde_json::json!({
                "summary": ProfileSummary::from_payload(&payload, &state),
                "charts": build_profile_charts(&payload),
            }))?;
        }
        Command::Filters { data_source } => {
            let client = PortalClient::new(&settings)?;
            let data_source = data_source.unwrap_or_else(|| settings.default_data_source.clone());
            let catalogue = client.fetch_filters(&data_source).await?;
            print_json(&catalogue)?;
        }
    }

    Ok(())
}
