use anyhow::Result;

use super::Context;
use crate::render;

pub async fn run(ctx: &Context) -> Result<()> {
    let report = ctx.client()?.health().await?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::health(&report));
    }
    Ok(())
}
