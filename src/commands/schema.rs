use anyhow::Result;
use solr_bridge_core::schema;

use super::Bridge;

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum SchemaFormat {
    Xml,
    Json,
}

/// Print the generated schema.
pub fn run_schema(bridge: &Bridge, format: SchemaFormat) -> Result<()> {
    let declaration = schema::generate(&bridge.registry, &bridge.store);
    match format {
        SchemaFormat::Xml => print!("{}", declaration.to_xml()),
        SchemaFormat::Json => println!("{}", serde_json::to_string_pretty(&declaration.fields)?),
    }
    Ok(())
}
