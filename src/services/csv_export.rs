use crate::models::QueryLog;

/// Column order users' spreadsheets depend on.
pub const CSV_HEADER: [&str; 7] = [
    "Hotel Name",
    "Location",
    "Price",
    "Currency",
    "Vendor",
    "Status",
    "Date",
];

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Flatten query logs into CSV text, header first, one line per log.
pub fn export_query_logs(logs: &[QueryLog]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for log in logs {
        let fields = [
            log.hotel_name.clone(),
            log.location.clone().unwrap_or_default(),
            log.price.map(|p| p.normalize().to_string()).unwrap_or_default(),
            log.currency.clone().unwrap_or_default(),
            log.vendor.clone().unwrap_or_default(),
            log.status.as_str().to_string(),
            log.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ];
        let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogStatus;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn log(name: &str, location: Option<&str>, price: Option<Decimal>) -> QueryLog {
        QueryLog {
            id: None,
            session_id: None,
            hotel_name: name.into(),
            location: location.map(str::to_string),
            price,
            currency: Some("EUR".into()),
            vendor: Some("Booking.com".into()),
            status: LogStatus::Success,
            created_at: Utc.with_ymd_and_hms(2026, 4, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_header_order() {
        let csv = export_query_logs(&[]);
        assert_eq!(csv, "Hotel Name,Location,Price,Currency,Vendor,Status,Date\n");
    }

    #[test]
    fn test_row_field_order() {
        let csv = export_query_logs(&[log("Grand", Some("Rome"), Some(Decimal::new(24500, 2)))]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "Grand,Rome,245,EUR,Booking.com,success,2026-04-02 09:30:00");
    }

    #[test]
    fn test_quotes_and_missing_values() {
        let csv = export_query_logs(&[log("The \"Ritz\", Paris", None, None)]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "\"The \"\"Ritz\"\", Paris\",,,EUR,Booking.com,success,2026-04-02 09:30:00"
        );
    }
}
