use freeflow_core::AliasTable;

use crate::error::CliError;

use super::CommandResult;

pub fn run(alias_table: &AliasTable) -> Result<CommandResult, CliError> {
    Ok(CommandResult::ok(serde_json::to_value(alias_table)?))
}
