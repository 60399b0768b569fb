use rust_decimal::Decimal;

use crate::models::{priced, DailyPrice};

/// Mean of the competitor prices that carry data.
pub fn market_average(row: &DailyPrice) -> Option<Decimal> {
    let prices: Vec<Decimal> = row
        .competitors
        .iter()
        .filter_map(|c| priced(c.price))
        .collect();

    if prices.is_empty() {
        return None;
    }

    let sum: Decimal = prices.iter().sum();
    Some((sum / Decimal::from(prices.len() as i64)).round_dp(2))
}

/// Percent distance of the target from the market average.
/// Positive means the target is priced above the market.
pub fn deviation_pct(target: Option<Decimal>, average: Option<Decimal>) -> Option<Decimal> {
    let target = priced(target)?;
    let average = priced(average)?;
    Some(((target - average) / average * Decimal::ONE_HUNDRED).round_dp(2))
}

/// Recompute market average and deviation for every row.
/// Backend-supplied values are replaced so all rows follow the same rule.
pub fn annotate_daily(rows: &mut [DailyPrice]) {
    for row in rows.iter_mut() {
        row.market_average = market_average(row);
        row.deviation_pct = deviation_pct(row.target_price, row.market_average);
    }
}
