pub mod check_in;
pub mod delivery;
pub mod health;
pub mod push_token;
pub mod storage;
pub mod video_get;
pub mod video_upload;
