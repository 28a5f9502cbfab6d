use std::sync::Arc;

use kaiwa_db::Database;
use kaiwa_gateway::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    /// Also held by the in-process session adapters in kaiwa-server.
    pub db: Arc<Database>,
    pub dispatcher: Dispatcher,
    pub jwt_secret: String,
}
