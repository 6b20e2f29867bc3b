use std::sync::Arc;

use crate::collaborators::ocr::DocumentOcr;
use crate::collaborators::speech::SpeechToText;
use crate::collaborators::tts::SpeechSynthesizer;
use crate::config::Config;
use crate::llm_client::ModelClient;

/// Shared application state injected into all route handlers via Axum
/// extractors. Every handle is immutable after startup; requests share
/// nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ModelClient>,
    pub speech: Arc<dyn SpeechToText>,
    pub ocr: Arc<dyn DocumentOcr>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    #[allow(dead_code)]
    pub config: Config,
}
