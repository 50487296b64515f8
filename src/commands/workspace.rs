use anyhow::Result;
use dialoguer::Confirm;

use crate::ui;
use crate::workspace::Workspace;
use crate::Context;

/// Tear down a repository's workspace end to end.
pub fn destroy(ctx: &Context, repository: &str, yes: bool) -> Result<()> {
    let ws = Workspace::load(repository)?;

    if !ctx.quiet {
        ui::header(&format!("Destroying {repository}"));
        ui::dim(&format!("namespace: {}", ws.namespace()));
        if ctx.verbose > 0 {
            ui::dim(&format!("release: {}", ws.repository()));
        }
    }

    if !yes && !confirm_destroy(repository)? {
        ui::warn("Aborted");
        return Ok(());
    }

    ws.destroy()?;
    ui::success(&format!("{repository} torn down"));
    Ok(())
}

/// Redeploy the installed chart.
pub fn bounce(_ctx: &Context, repository: &str) -> Result<()> {
    let ws = Workspace::load(repository)?;
    ws.bounce()?;
    ui::success(&format!("{repository} bounced"));
    Ok(())
}

/// Preview what a bounce would change.
pub fn diff(_ctx: &Context, repository: &str) -> Result<()> {
    let ws = Workspace::load(repository)?;
    ws.diff()
}

fn confirm_destroy(repository: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Permanently destroy {repository}'s release and infrastructure?"
        ))
        .default(false)
        .interact()?;

    Ok(confirmed)
}
