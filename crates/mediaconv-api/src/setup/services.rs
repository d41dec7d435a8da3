//! Builds the application state and starts the conversion worker pool.

use std::sync::{Arc, Weak};

use mediaconv_core::Config;
use mediaconv_processing::{PageRenderer, PdfiumRenderer, Rasterizer, RasterizerConfig};
use mediaconv_worker::{JobFinishedSender, JobHandlerContext, JobQueue, JobQueueConfig};

use super::database::Stores;
use crate::state::AppState;

/// Build the state with the pdfium page renderer.
pub fn initialize_services(config: &Config, stores: Stores) -> Arc<AppState> {
    let renderer = Arc::new(PdfiumRenderer::new(
        config.pdfium_lib_path().map(String::from),
    ));
    build_app_state(config, stores, renderer)
}

/// Build the state around an explicit page renderer. Workers are not started.
pub fn build_app_state(
    config: &Config,
    stores: Stores,
    renderer: Arc<dyn PageRenderer>,
) -> Arc<AppState> {
    let rasterizer = Rasterizer::new(
        RasterizerConfig {
            max_dimension: config.conversion_max_dimension(),
            pdf_dpi: config.pdf_render_dpi(),
        },
        renderer,
    );
    let job_queue = JobQueue::new(stores.jobs, JobQueueConfig::from(config));

    tracing::info!(
        max_dimension = config.conversion_max_dimension(),
        pdf_dpi = config.pdf_render_dpi(),
        max_workers = config.job_queue_max_workers(),
        "Services initialized"
    );

    Arc::new(AppState::new(
        config.clone(),
        stores.media,
        job_queue,
        rasterizer,
    ))
}

/// Start the worker pool with the state as its dispatch context.
pub fn start_job_workers(state: &Arc<AppState>, job_finished_tx: Option<JobFinishedSender>) {
    let context: Weak<dyn JobHandlerContext> = Arc::downgrade(state) as Weak<dyn JobHandlerContext>;
    state.job_queue.start_workers(context, job_finished_tx);
}
