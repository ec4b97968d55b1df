use crate::service::IdeaService;

// app's shared state
pub struct AppState {
    pub service: IdeaService,
}

impl AppState {
    pub fn new(service: IdeaService) -> Self {
        Self { service }
    }
}
