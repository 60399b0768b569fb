pub mod forms;
pub mod market;
pub mod parity;
pub mod price_format;
pub mod progress;
pub mod rate_grid;
pub mod reports;
pub mod vendors;

pub use forms::{validate_scan, FormViolation, HotelFormPolicy};
pub use market::annotate_daily;
pub use parity::{evaluate, ParityCell, ParityStatus};
pub use price_format::{normalize_price, PriceDisplay};
pub use progress::{scan_progress, ScanProgress};
pub use rate_grid::{build_daily_matrix, build_vendor_grid, DailyMatrix, VendorGrid, MAX_COMPETITORS};
pub use reports::{build_report, ReportSummary};
pub use vendors::{aggregate_vendors, VendorCount, VendorSelection, DEFAULT_VISIBLE_VENDORS};
