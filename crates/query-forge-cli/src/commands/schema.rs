use query_forge_backend::traits::SchemaExtractor;
use query_forge_core::types::FieldMap;
use query_forge_elastic::ElasticBackend;
use query_forge_mongo::MongoBackend;

use crate::cli::{GlobalOpts, SchemaArgs};
use crate::config;
use crate::error::CliError;

pub async fn run(args: SchemaArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = config::load(global.config.as_deref())?;
    let kind = args
        .backend
        .map(|backend| backend.as_str().to_string())
        .unwrap_or_else(|| config.backend.kind.clone());
    let url = args.url.unwrap_or_else(|| config.backend.url.clone());
    let name = args
        .name
        .unwrap_or_else(|| config.backend.index_or_collection.clone());

    let fields = match kind.as_str() {
        "search" => {
            let backend = ElasticBackend::connect(&url, name)?
                .with_category_fields(config.backend.category_fields.clone())
                .with_fields_to_ignore(config.backend.fields_to_ignore.clone());
            backend.extract().await?
        }
        "doc" => {
            let backend = MongoBackend::connect(&url, &config.backend.database, &name)
                .await?
                .with_sample_size(config.backend.sample_size)
                .with_category_fields(config.backend.category_fields.clone())
                .with_fields_to_ignore(config.backend.fields_to_ignore.clone());
            backend.extract().await?
        }
        other => {
            return Err(CliError::Config {
                message: format!("unknown backend kind '{other}': expected 'search' or 'doc'"),
            });
        }
    };

    print_field_map(&fields, global);
    Ok(())
}

fn print_field_map(fields: &FieldMap, global: &GlobalOpts) {
    if global.format == "json" {
        // FieldMap serializes as {path: spec}.
        match serde_json::to_string_pretty(fields) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("error: could not serialize field map: {e}"),
        }
        return;
    }
    for (path, spec) in fields.iter() {
        let mut line = format!("{path}\t{}", spec.kind);
        if let Some(values) = &spec.values {
            line.push_str(&format!("\t{values}"));
        }
        if let Some(item) = spec.item_kind {
            line.push_str(&format!("\t[{item}]"));
        }
        println!("{line}");
    }
    eprintln!("{} field(s)", fields.len());
}
