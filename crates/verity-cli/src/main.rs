//! AI-video likelihood analysis binary.
//!
//! Usage: `verity <video-file> [more files...]`
//!
//! Prints one JSON result per file plus the certification action for its
//! verdict. Exits non-zero when any file fails to analyze.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use verity_detect::{Analyzer, DetectionConfig, QuickEngine};
use verity_vision::{VisionClient, VisionConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("verity=info".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: verity <video-file> [more files...]");
        std::process::exit(2);
    }

    // Load configuration
    let config = match DetectionConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut analyzer = match Analyzer::new(config) {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to create analyzer: {}", e);
            std::process::exit(1);
        }
    };

    // Secondary engine: the hosted vision model when an API key is set,
    // otherwise the local quick heuristic so the combiner still has a
    // cross-check.
    let vision_config = VisionConfig::from_env();
    if vision_config.is_configured() {
        match VisionClient::new(vision_config) {
            Ok(client) => {
                analyzer = analyzer.with_engine(Arc::new(client));
            }
            Err(e) => {
                warn!("Vision engine disabled: {}", e);
                analyzer = analyzer.with_engine(Arc::new(QuickEngine::new()));
            }
        }
    } else {
        info!("OPENAI_API_KEY not set, using quick heuristic engine");
        analyzer = analyzer.with_engine(Arc::new(QuickEngine::new()));
    }

    let mut failed = false;
    for path in &paths {
        info!("Analyzing {}", path);
        match analyzer.analyze(path).await {
            Ok(result) => {
                let action = analyzer.action_for(&result);
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize result for {}: {}", path, e);
                        failed = true;
                        continue;
                    }
                }
                println!(
                    "{}: {} (ai_score {}, action {})",
                    path, result.label, result.ai_score, action
                );
            }
            Err(e) => {
                error!("Analysis failed for {}: {}", path, e);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
