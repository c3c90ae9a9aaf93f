use anyhow::{Context, Result};
use mise_server::AppState;
use std::path::Path;

/// Serve the panel in the browser until Ctrl-C.
pub fn run(root: &Path, port: u16, no_open: bool) -> Result<()> {
    let state = AppState::for_workspace(root.to_path_buf())
        .context("failed to prepare the panel host")?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!(
            "mise panel for {} → http://localhost:{actual_port}",
            root.display()
        );

        let ctx = state.ctx.clone();
        tokio::select! {
            res = mise_server::serve_on(state, listener, !no_open) => res,
            _ = tokio::signal::ctrl_c() => {
                ctx.cancel(None);
                Ok(())
            }
        }
    })
}
