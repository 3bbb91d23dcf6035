//! Store wiring

use sqlx::PgPool;
use std::sync::Arc;
use vigil_db::{CheckInRepository, UserRepository, VideoRepository};

use crate::state::Stores;

/// PostgreSQL-backed stores sharing one pool.
pub fn repositories(pool: &PgPool) -> Stores {
    Stores {
        videos: Arc::new(VideoRepository::new(pool.clone())),
        check_ins: Arc::new(CheckInRepository::new(pool.clone())),
        users: Arc::new(UserRepository::new(pool.clone())),
    }
}
