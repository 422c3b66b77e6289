use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use ecgwave_core::{GeneratorKind, HeartRateDriver, JsonlStore, RecordStore};

pub struct MonitorConfig {
    pub generator: GeneratorKind,
    pub patient: String,
    pub heart_rate: u32,
    pub store_path: Option<PathBuf>,
}

pub fn run(config: MonitorConfig) -> io::Result<()> {
    let store: Option<Arc<dyn RecordStore>> = match &config.store_path {
        Some(path) => Some(Arc::new(JsonlStore::open(path).map_err(io::Error::other)?)),
        None => None,
    };

    let mut app = crate::tui::app::App::new(
        config.generator.build(),
        HeartRateDriver::new(config.heart_rate),
        config.patient,
        store,
    );
    app.run()
}
