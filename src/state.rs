// 应用共享状态
// 启动时构建一次，经 Arc 注入各路由处理器

use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::services::{DatabaseService, MatlabApiClient, OctaveRunner, ProblemCatalog, Verifier};

pub struct AppState {
    pub config: Config,
    pub catalog: ProblemCatalog,
    pub db: DatabaseService,
    pub octave: Arc<OctaveRunner>,
    pub verifier: Verifier,
    pub matlab: Option<MatlabApiClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let catalog = ProblemCatalog::load(&config.problems_path)?;

        let db = DatabaseService::new(&config.database_path())
            .map_err(|e| anyhow!("Failed to open database: {}", e))?;

        let octave = Arc::new(OctaveRunner::new(config.octave()));
        let verifier = Verifier::new(octave.clone());
        let matlab = config.matlab_api_url.as_deref().map(MatlabApiClient::new);

        Ok(Arc::new(Self {
            config,
            catalog,
            db,
            octave,
            verifier,
            matlab,
        }))
    }
}
