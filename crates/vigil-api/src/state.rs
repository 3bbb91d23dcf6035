//! Application state shared by every handler.

use sqlx::PgPool;
use std::sync::Arc;
use vigil_core::Config;
use vigil_db::{CheckInStore, UserStore, VideoStore};
use vigil_services::{CheckInService, DeliveryService, StorageAccountingService, UploadService};
use vigil_storage::Storage;

use crate::auth::JwtService;

/// The stores the services are built on. Production wires the PostgreSQL
/// repositories in; tests can use in-memory ones.
#[derive(Clone)]
pub struct Stores {
    pub videos: Arc<dyn VideoStore>,
    pub check_ins: Arc<dyn CheckInStore>,
    pub users: Arc<dyn UserStore>,
}

pub struct AppState {
    pub config: Config,
    /// Absent when running without a database (tests).
    pub pool: Option<PgPool>,
    pub storage: Arc<dyn Storage>,
    pub users: Arc<dyn UserStore>,
    pub jwt: Arc<JwtService>,
    pub accounting: StorageAccountingService,
    pub upload: UploadService,
    pub check_in: CheckInService,
    pub delivery: DeliveryService,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: Option<PgPool>,
        stores: Stores,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let accounting = StorageAccountingService::new(stores.users.clone());
        let upload = UploadService::new(
            storage.clone(),
            stores.videos.clone(),
            accounting.clone(),
            config.default_timer_days(),
            config.max_timer_days(),
            config.max_upload_size_bytes(),
        );
        let check_in = CheckInService::new(
            stores.videos.clone(),
            stores.check_ins.clone(),
            config.default_timer_days(),
            config.max_timer_days(),
        );
        let delivery = DeliveryService::new(stores.videos.clone(), storage.clone());
        let jwt = Arc::new(JwtService::new(config.jwt_secret()));

        Self {
            config,
            pool,
            storage,
            users: stores.users,
            jwt,
            accounting,
            upload,
            check_in,
            delivery,
        }
    }
}
