//! Vigil Services Layer
//!
//! Business services that sit between the HTTP handlers and the stores:
//! storage accounting, check-ins, uploads, public delivery and push
//! notifications, plus the lifecycle sweeps run by the job scheduler.
//! Handlers stay thin and call into these.

pub mod check_in;
pub mod delivery;
pub mod push;
pub mod storage_accounting;
pub mod sweeps;
pub mod upload;

pub use check_in::CheckInService;
pub use delivery::{parse_range_header, sanitize_filename, ByteRange, Delivery, DeliveryService};
pub use push::{create_push_sender, ExpoPushSender, PushSender};
pub use storage_accounting::StorageAccountingService;
pub use sweeps::{DistributionSweep, ExpirationSweep, NotificationSweep};
pub use upload::{UploadRequest, UploadService};
