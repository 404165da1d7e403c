//! Command implementations for the Vitrine CLI.

use std::fs;
use std::path::Path;

use anyhow::Context;
use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{EngineConfig, InteractionWeights};
use crate::engine::RecommendationEngine;
use crate::error::{Result, VitrineError};
use crate::neighbors::{DistanceMetric, IndexStructure};

/// Execute a CLI command.
pub fn execute_command(args: VitrineArgs) -> Result<()> {
    match &args.command {
        Command::Run(run_args) => run_recommendations(run_args, &args),
        Command::Popular(popular_args) => show_popular(popular_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
    }
}

/// Load, build, train and recommend for one user.
fn run_recommendations(args: &RunArgs, cli_args: &VitrineArgs) -> Result<()> {
    let config = resolve_config(&args.engine)?;
    let limit = args.limit.unwrap_or(config.recommendations.limit);
    info!(
        "Starting recommendation engine with: file={}, user={}, limit={limit}",
        args.interactions.display(),
        args.user_id
    );

    let exclusions = match &args.exclude {
        Some(path) => load_exclusions(path)?,
        None => Vec::new(),
    };

    let engine = prepare_engine(config, &args.interactions, args.products.as_deref())?;

    info!("Generating recommendations...");
    let recommendations = engine.recommend_with_exclusions(&args.user_id, limit, &exclusions);

    output_products(&recommendations, engine.products(), cli_args)
}

/// List the most popular products.
fn show_popular(args: &PopularArgs, cli_args: &VitrineArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let limit = args.limit.unwrap_or(config.recommendations.limit);

    let mut engine = RecommendationEngine::new(config);
    engine
        .load(&args.interactions, None)
        .context("Failed to load data")?;

    output_products(&engine.popular(limit), None, cli_args)
}

/// Build the full pipeline and report its shape.
fn show_stats(args: &StatsArgs, cli_args: &VitrineArgs) -> Result<()> {
    let config = resolve_config(&args.engine)?;
    let engine = prepare_engine(config, &args.interactions, args.products.as_deref())?;
    output_stats(&engine.stats(), cli_args)
}

fn prepare_engine(
    config: EngineConfig,
    interactions: &Path,
    products: Option<&Path>,
) -> Result<RecommendationEngine> {
    let mut engine = RecommendationEngine::new(config);

    info!("Loading data...");
    engine
        .load(interactions, products)
        .context("Failed to load data")?;

    info!("Creating user-item matrix...");
    engine
        .build_matrix()
        .context("Failed to create user-item matrix")?;

    info!("Training model...");
    engine.train().context("Failed to train model")?;

    Ok(engine)
}

/// Merge the config file with explicit command line overrides.
fn resolve_config(args: &EngineArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            EngineConfig::from_file(path)?
        }
        None => EngineConfig::default(),
    };

    if let Some(n_neighbors) = args.neighbors {
        config.neighbors.n_neighbors = n_neighbors;
    }
    if let Some(metric) = &args.metric {
        config.neighbors.metric = DistanceMetric::parse_str(metric)?;
    }
    if let Some(structure) = &args.structure {
        config.neighbors.structure = IndexStructure::parse_str(structure)?;
    }
    if let Some(spec) = &args.weights {
        config.weights = InteractionWeights::parse_spec(spec)?;
    }

    Ok(config)
}

/// Read a JSON array of product ids to exclude.
fn load_exclusions(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(VitrineError::source_not_found(path));
    }
    let content = fs::read_to_string(path)?;
    let ids: Vec<String> = serde_json::from_str(&content).map_err(|e| {
        VitrineError::malformed(format!("Invalid exclusion list {}: {e}", path.display()))
    })?;
    info!("Excluding {} products from recommendations", ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_config_overrides() {
        let args = EngineArgs {
            neighbors: Some(7),
            metric: Some("euclidean".to_string()),
            structure: Some("brute_force".to_string()),
            weights: Some("click=1,view=1,favorite=1,purchase=1".to_string()),
            ..Default::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.neighbors.n_neighbors, 7);
        assert_eq!(config.neighbors.metric, DistanceMetric::Euclidean);
        assert_eq!(config.neighbors.structure, IndexStructure::BruteForce);
        assert_eq!(config.weights.purchase, 1.0);
    }

    #[test]
    fn test_resolve_config_rejects_bad_metric() {
        let args = EngineArgs {
            metric: Some("jaccard".to_string()),
            ..Default::default()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_load_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchased.json");
        fs::write(&path, r#"["P1", "P7"]"#).unwrap();
        assert_eq!(load_exclusions(&path).unwrap(), vec!["P1", "P7"]);

        fs::write(&path, r#"{"P1": true}"#).unwrap();
        assert!(matches!(
            load_exclusions(&path),
            Err(VitrineError::MalformedInput(_))
        ));

        assert!(matches!(
            load_exclusions(&dir.path().join("missing.json")),
            Err(VitrineError::SourceNotFound { .. })
        ));
    }
}
