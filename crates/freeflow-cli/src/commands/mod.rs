mod aliases;
mod fcf;

use std::sync::Arc;
use std::time::Duration;

use freeflow_core::{
    AliasTable, AlphaVantageAdapter, FcfResolver, FixtureSource, ProviderId, StatementSource,
    YahooAdapter,
};
use serde_json::Value;

use crate::cli::{Cli, Command, SourceSelector};
use crate::envelope::{Envelope, EnvelopeError};
use crate::error::CliError;
use crate::metadata::Metadata;

#[derive(Debug)]
pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let alias_table = match &cli.aliases {
        Some(path) => AliasTable::from_path(path)?,
        None => AliasTable::default(),
    };
    let provider = cli.source.provider_id();

    let command_result = match &cli.command {
        Command::Aliases => aliases::run(&alias_table)?,
        Command::Fcf(args) => {
            let resolver = FcfResolver::new(build_source(cli)?)
                .with_aliases(alias_table)
                .with_fetch_timeout(Duration::from_millis(cli.timeout_ms));
            fcf::run(args, &resolver).await?
        }
    };

    Ok(into_envelope(provider, command_result))
}

fn into_envelope(provider: ProviderId, command_result: CommandResult) -> Envelope<Value> {
    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
    } = command_result;

    let mut metadata = Metadata::new(provider, latency_ms);
    for warning in warnings {
        metadata.push_warning(warning);
    }

    Envelope::with_errors(metadata.into_envelope_meta(), data, errors)
}

fn build_source(cli: &Cli) -> Result<Arc<dyn StatementSource>, CliError> {
    let source: Arc<dyn StatementSource> = match cli.source {
        SourceSelector::Yahoo => Arc::new(YahooAdapter::default().with_timeout_ms(cli.timeout_ms)),
        SourceSelector::Alphavantage => {
            Arc::new(AlphaVantageAdapter::default().with_timeout_ms(cli.timeout_ms))
        }
        SourceSelector::Fixture => {
            let path = cli.fixture.as_ref().ok_or_else(|| {
                CliError::Command(String::from("--source fixture requires --fixture <path>"))
            })?;
            Arc::new(FixtureSource::from_path(path)?)
        }
    };
    Ok(source)
}
