use clap::{Parser, Subcommand};
use reqwest::{header, redirect, Client, StatusCode};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator checks for the backend gateway", long_about = None)]
struct Cli {
    /// Gateway base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one GET through the gateway and report what came back
    Probe {
        #[arg(short, long, default_value = "/")]
        path: String,
    },
    /// Send the same GET directly and through the gateway and compare
    Compare {
        /// Upstream base URL, reached without the gateway.
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        upstream: String,

        #[arg(short, long, default_value = "/")]
        path: String,
    },
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    url: String,
    status: u16,
    location: Option<String>,
    content_type: Option<String>,
    body_bytes: usize,
    #[serde(skip)]
    body: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct CompareReport {
    direct: ProbeReport,
    gateway: ProbeReport,
    status_matches: bool,
    body_matches: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Redirects are part of what is being checked; never follow them.
    let client = Client::builder()
        .redirect(redirect::Policy::none())
        .no_proxy()
        .build()?;

    match cli.command {
        Commands::Probe { path } => {
            let report = probe(&client, &join(&cli.url, &path)).await?;
            if report.status == StatusCode::BAD_GATEWAY.as_u16() {
                eprintln!("Gateway answered 502: backend unreachable");
                eprintln!("{}", String::from_utf8_lossy(&report.body));
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Compare { upstream, path } => {
            let direct = probe(&client, &join(&upstream, &path)).await?;
            let gateway = probe(&client, &join(&cli.url, &path)).await?;
            let report = CompareReport {
                status_matches: direct.status == gateway.status,
                body_matches: direct.body == gateway.body,
                direct,
                gateway,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !(report.status_matches && report.body_matches) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn probe(client: &Client, url: &str) -> Result<ProbeReport, reqwest::Error> {
    let res = client.get(url).send().await?;
    let status = res.status().as_u16();
    let header_text = |name: header::HeaderName| {
        res.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let location = header_text(header::LOCATION);
    let content_type = header_text(header::CONTENT_TYPE);
    let body = res.bytes().await?.to_vec();

    Ok(ProbeReport {
        url: url.to_string(),
        status,
        location,
        content_type,
        body_bytes: body.len(),
        body,
    })
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
