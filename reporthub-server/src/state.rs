use reporthub_service::ReportRequestService;

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub service: ReportRequestService,
}

impl AppState {
    pub fn new(service: ReportRequestService) -> Self {
        Self { service }
    }
}
