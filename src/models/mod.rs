pub mod hotel;
pub mod price;
pub mod session;

pub use hotel::{split_target, CompSet, DirectorySuggestion, Hotel, HotelUpdate, NewHotel};
pub use price::{priced, sort_intraday, CompetitorDayPrice, DailyPrice, IntradayEvent, Offer, PriceInfo, Trend};
pub use session::{LogStatus, QueryLog, ScanRequest, ScanSession, ScanStatus, TraceEntry};
