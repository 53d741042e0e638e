use std::time::Instant;

use freeflow_core::{FcfResolver, MetricResult, Resolution, Strategy, Symbol};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::cli::FcfArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct FcfResponseData {
    results: Vec<FcfRow>,
}

#[derive(Debug, Serialize)]
struct FcfRow {
    symbol: Symbol,
    strategy: Option<Strategy>,
    fcf_ttm: MetricResult,
}

pub async fn run(args: &FcfArgs, resolver: &FcfResolver) -> Result<CommandResult, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let started = Instant::now();
    let resolutions = resolve_all(resolver, &symbols).await?;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut warnings = Vec::new();
    let mut errors = Vec::new();
    let mut results = Vec::with_capacity(symbols.len());
    for (symbol, resolution) in symbols.into_iter().zip(resolutions) {
        if let Some(note) = resolution.result.note() {
            warnings.push(format!("{symbol}: {note}"));
        }
        if let Some(error) = resolution.result.error() {
            errors.push(EnvelopeError::new(error.code(), error.to_string()).with_symbol(symbol.as_str()));
        }
        results.push(FcfRow {
            symbol,
            strategy: resolution.strategy,
            fcf_ttm: resolution.result,
        });
    }

    let data = serde_json::to_value(FcfResponseData { results })?;
    Ok(CommandResult::ok(data)
        .with_warnings(warnings)
        .with_errors(errors)
        .with_latency(latency_ms))
}

/// Resolves every symbol concurrently; results come back in input order.
async fn resolve_all(
    resolver: &FcfResolver,
    symbols: &[Symbol],
) -> Result<Vec<Resolution>, CliError> {
    let mut tasks = JoinSet::new();
    for (index, symbol) in symbols.iter().cloned().enumerate() {
        let resolver = resolver.clone();
        tasks.spawn(async move { (index, resolver.resolve_detailed(&symbol).await) });
    }

    let mut slots: Vec<Option<Resolution>> = vec![None; symbols.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, resolution) =
            joined.map_err(|error| CliError::Command(format!("resolution task failed: {error}")))?;
        slots[index] = Some(resolution);
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| CliError::Command(String::from("missing resolution"))))
        .collect()
}
