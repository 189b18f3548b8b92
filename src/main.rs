use anyhow::Result;
use log::info;

use bananaprep::config::Config;
use bananaprep::routes;
use bananaprep::state::AppState;

/// 日志输出：时间戳 + 级别 + 目标，级别由配置决定
fn setup_logging(level: &str) -> Result<(), fern::InitError> {
    let level = level
        .parse::<log::LevelFilter>()
        .unwrap_or(log::LevelFilter::Info);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    setup_logging(&config.log_level)?;

    let state = AppState::new(config)?;
    info!(
        "Catalog ready with {} problems, database at {}",
        state.catalog.len(),
        state.db.db_path().display()
    );

    if let Some(matlab) = &state.matlab {
        if matlab.is_healthy().await {
            info!("MATLAB engine reachable at {}", matlab.base_url());
        } else {
            log::warn!("MATLAB engine configured but not reachable yet");
        }
    }

    let addr = state.config.bind_addr();
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
