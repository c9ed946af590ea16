use query_forge_core::schema::FilterSchema;

use crate::cli::{GlobalOpts, ValidateArgs};
use crate::commands::{field_map_from_mapping_file, read_json};
use crate::error::CliError;

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let fields = field_map_from_mapping_file(&args.mapping)?;
    let schema = FilterSchema::new(fields)?;
    let raw = read_json(&args.filter)?;
    let validated = schema.validate(&raw)?;

    for warning in &validated.warnings {
        eprintln!("warning: {warning}");
    }

    let canonical = serde_json::to_string_pretty(&validated.filters).map_err(|e| {
        CliError::Config {
            message: format!("could not serialize canonical IR: {e}"),
        }
    })?;
    println!("{canonical}");
    if global.format != "json" {
        eprintln!("ok: {} slice(s)", validated.filters.len());
    }
    Ok(())
}
