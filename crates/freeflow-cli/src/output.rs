use serde::Deserialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::display::{self, ResultRow};
use crate::envelope::Envelope;
use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct ResultsData {
    results: Vec<ResultRow>,
}

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
    explain: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => render_table(envelope, explain)?,
    }

    Ok(())
}

fn render_table(envelope: &Envelope<Value>, explain: bool) -> Result<(), CliError> {
    match ResultsData::deserialize(&envelope.data) {
        Ok(data) => {
            println!(
                "{}",
                display::render_results(&data.results, display::color_enabled(), explain)
            );
        }
        Err(_) => {
            let pretty_data = serde_json::to_string_pretty(&envelope.data)?;
            println!("{pretty_data}");
        }
    }

    if explain {
        println!();
        println!("request_id  : {}", envelope.meta.request_id);
        println!("source      : {}", envelope.meta.source);
        println!("generated_at: {}", envelope.meta.generated_at);
        println!("latency_ms  : {}", envelope.meta.latency_ms);
    }

    Ok(())
}
