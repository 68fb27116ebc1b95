use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::forecast::ParameterStore;
use crate::imagery::{ImageProvider, MapView, StaticMapsClient};
use crate::pipeline::AssessmentPipeline;
use crate::vision::{GeminiClient, RooftopAnalyzer};

/// Model names reported by the health endpoint.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub vision_model: String,
    pub text_model: String,
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AssessmentPipeline>,
    pub params: ParameterStore,
    pub models: ModelInfo,
}

impl AppState {
    /// Builds both provider clients and loads the parameter set.
    pub fn new(cfg: &Config) -> Result<Self> {
        let params = ParameterStore::load(&cfg.parameters.path);

        let imagery: Arc<dyn ImageProvider> = Arc::new(StaticMapsClient::new(&cfg.imagery)?);
        let gemini = GeminiClient::new(&cfg.vision)?;

        info!(
            vision_model = %gemini.model(),
            text_model = %cfg.vision.text_model,
            imagery_base_url = %cfg.imagery.base_url,
            "provider clients ready"
        );

        let analyzer: Arc<dyn RooftopAnalyzer> = Arc::new(gemini);
        Ok(Self::with_providers(
            imagery,
            analyzer,
            params,
            cfg.imagery.map_view(),
            ModelInfo {
                vision_model: cfg.vision.vision_model.clone(),
                text_model: cfg.vision.text_model.clone(),
            },
        ))
    }

    /// Wires a state around arbitrary providers, e.g. test doubles.
    pub fn with_providers(
        imagery: Arc<dyn ImageProvider>,
        analyzer: Arc<dyn RooftopAnalyzer>,
        params: ParameterStore,
        view: MapView,
        models: ModelInfo,
    ) -> Self {
        let pipeline = Arc::new(AssessmentPipeline::new(
            imagery,
            analyzer,
            params.shared(),
            view,
        ));
        Self {
            pipeline,
            params,
            models,
        }
    }
}
