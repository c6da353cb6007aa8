use std::sync::Arc;

use timetabler_config::{CorsConfig, JwtConfig, StoreConfig, TimetableConfig};
use timetabler_store::{StoreResult, Stores};

use crate::modules::timetable::service::SlotManager;

#[derive(Clone, Debug)]
pub struct AppState {
    pub stores: Stores,
    pub slot_manager: Arc<SlotManager>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(
        stores: Stores,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        timetable_config: &TimetableConfig,
    ) -> Self {
        let slot_manager = Arc::new(SlotManager::new(stores.schedules.clone(), timetable_config));

        Self {
            stores,
            slot_manager,
            jwt_config,
            cors_config,
        }
    }
}

pub async fn init_app_state() -> StoreResult<AppState> {
    let stores = Stores::connect(&StoreConfig::from_env()).await?;

    Ok(AppState::new(
        stores,
        JwtConfig::from_env(),
        CorsConfig::from_env(),
        &TimetableConfig::from_env(),
    ))
}
