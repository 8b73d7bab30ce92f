use crate::settings;
use anyhow::Result;
use wizard_core::config::{WarnLevel, WizardConfig};
use wizard_server::AppState;

pub fn run(config: &WizardConfig, no_open: bool) -> Result<()> {
    for w in config.validate() {
        match w.level {
            WarnLevel::Error => tracing::error!("{}", w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }
    let completer = settings::completer(config)?;
    let app_state = AppState::from_config(config, completer);
    let port = config.server.port;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!(
            "SDLC wizard → http://localhost:{actual_port}  (WebSocket: ws://localhost:{actual_port}/ws, mode: {})",
            app_state.mode
        );
        wizard_server::serve_on(app_state, listener, !no_open).await
    })
}
