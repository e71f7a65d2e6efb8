use anyhow::Result;

use super::Context;
use crate::render;

/// List local recent checks, or the backend's history page with `remote`.
pub async fn run(ctx: &Context, remote: bool, page: u32, limit: u32) -> Result<()> {
    if remote {
        let history = ctx.client()?.history(page, limit).await?;
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&history)?);
        } else {
            print!("{}", render::remote_history(&history));
        }
        return Ok(());
    }

    let checks = ctx.store().list()?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        print!("{}", render::recent_checks(&checks));
    }
    Ok(())
}
