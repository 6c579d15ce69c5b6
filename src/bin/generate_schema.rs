//! Generate JSON Schema for the repotree configuration
//!
//! This binary generates a JSON Schema from the Config struct using schemars.
//!
//! Usage:
//!   cargo run --features dev-bins --bin generate_schema > config-schema.json

use repotree::config::Config;
use schemars::schema_for;

fn main() -> anyhow::Result<()> {
    let schema = schema_for!(Config);
    let output = serde_json::to_string_pretty(&schema)?;
    println!("{}", output);
    Ok(())
}
