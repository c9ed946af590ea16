use query_forge_backend::traits::{QueryTranslator, TranslateOptions};
use query_forge_core::schema::FilterSchema;
use query_forge_elastic::ElasticTranslator;
use query_forge_mongo::MongoTranslator;

use crate::cli::{BackendKind, GlobalOpts, TranslateArgs};
use crate::commands::{field_map_from_mapping_file, read_json};
use crate::config;
use crate::error::CliError;

pub fn run(args: TranslateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = config::load(global.config.as_deref())?;
    let fields = field_map_from_mapping_file(&args.mapping)?;
    let schema = FilterSchema::new(fields)?;
    let raw = read_json(&args.filter)?;
    let validated = schema.validate(&raw)?;

    for warning in &validated.warnings {
        eprintln!("warning: {warning}");
    }

    let opts = TranslateOptions {
        bucket_size: args.bucket_size.unwrap_or(config.query.bucket_size),
        top_hits_size: args.top_hits_size.unwrap_or(config.query.top_hits_size),
    };
    let plans = match args.target {
        BackendKind::Search => {
            ElasticTranslator::new(opts).translate(&validated.filters, schema.fields())?
        }
        BackendKind::Doc => {
            MongoTranslator::new(opts).translate(&validated.filters, schema.fields())?
        }
    };

    let rendered = serde_json::to_string_pretty(&plans).map_err(|e| CliError::Config {
        message: format!("could not serialize plans: {e}"),
    })?;
    println!("{rendered}");
    if global.format != "json" {
        eprintln!("ok: {} plan(s) for target '{}'", plans.len(), args.target.as_str());
    }
    Ok(())
}
