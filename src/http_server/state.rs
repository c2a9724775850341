use std::sync::Arc;

use crate::config::Config;
use crate::database::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
}
