use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::creator::CreatorClient;
use crate::email::Notifier;
use crate::rate_limit::SubmissionRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub creator: CreatorClient,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub submission_limiter: SubmissionRateLimiter,
}
