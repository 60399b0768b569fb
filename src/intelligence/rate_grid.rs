use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::parity::{evaluate, ParityCell};
use super::price_format::{normalize_price, PriceDisplay};
use super::vendors::vendor_key;
use crate::models::{priced, DailyPrice, Hotel, Offer};

/// Maximum competitors rendered side by side.
pub const MAX_COMPETITORS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct VendorCell {
    pub vendor: String,
    #[serde(flatten)]
    pub cell: ParityCell,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridRow {
    pub hotel_id: Uuid,
    pub name: String,
    pub is_target: bool,
    pub headline: PriceDisplay,
    pub cells: Vec<VendorCell>,
}

/// Cheapest price in the grid and who offers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowestMarker {
    pub hotel_id: Uuid,
    pub vendor: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorGrid {
    pub vendors: Vec<String>,
    pub rows: Vec<GridRow>,
    pub lowest: Option<LowestMarker>,
}

impl VendorGrid {
    pub fn row(&self, hotel_id: Uuid) -> Option<&GridRow> {
        self.rows.iter().find(|r| r.hotel_id == hotel_id)
    }
}

/// Find an offer by case-insensitive vendor name.
pub fn find_offer<'a>(offers: &'a [Offer], vendor: &str) -> Option<&'a Offer> {
    let key = vendor_key(vendor);
    offers.iter().find(|o| vendor_key(&o.vendor) == key)
}

/// Restrict competitors to the user's hotel selection, capped at `max`.
pub fn select_competitors<'a>(
    competitors: &'a [Hotel],
    hotel_filter: Option<&[Uuid]>,
    max: usize,
) -> Vec<&'a Hotel> {
    competitors
        .iter()
        .filter(|h| hotel_filter.map_or(true, |ids| ids.contains(&h.id)))
        .take(max)
        .collect()
}

fn consider(lowest: &mut Option<LowestMarker>, hotel_id: Uuid, vendor: Option<&str>, price: Option<Decimal>) {
    let Some(price) = priced(price) else {
        return;
    };
    // Strict comparison: the earlier candidate (the target first) keeps ties.
    if lowest.as_ref().map_or(true, |l| price < l.price) {
        *lowest = Some(LowestMarker {
            hotel_id,
            vendor: vendor.map(str::to_string),
            price,
        });
    }
}

/// Hotels × OTA grid. Every offer is classified against the target's
/// headline price.
pub fn build_vendor_grid(
    target: &Hotel,
    competitors: &[Hotel],
    hotel_filter: Option<&[Uuid]>,
    vendors: &[String],
    max_competitors: usize,
) -> VendorGrid {
    let target_price = target.current_price();
    let currency = target.display_currency().to_string();
    let mut lowest: Option<LowestMarker> = None;

    let parties = std::iter::once(target).chain(select_competitors(
        competitors,
        hotel_filter,
        max_competitors,
    ));

    let rows = parties
        .map(|hotel| {
            let headline = PriceDisplay::from_price_info(hotel.price_info.as_ref(), &hotel.currency);
            consider(&mut lowest, hotel.id, None, hotel.current_price());

            let cells = vendors
                .iter()
                .map(|vendor| {
                    let offer_price = find_offer(hotel.offers(), vendor).and_then(|o| o.price);
                    consider(&mut lowest, hotel.id, Some(vendor.as_str()), offer_price);
                    VendorCell {
                        vendor: vendor.clone(),
                        cell: evaluate(offer_price, target_price, &currency),
                    }
                })
                .collect();

            GridRow {
                hotel_id: hotel.id,
                name: hotel.name.clone(),
                is_target: hotel.id == target.id,
                headline,
                cells,
            }
        })
        .collect();

    VendorGrid {
        vendors: vendors.to_vec(),
        rows,
        lowest,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixColumn {
    pub hotel_id: Uuid,
    pub name: String,
    pub is_target: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyCell {
    #[serde(flatten)]
    pub cell: ParityCell,
    pub is_estimated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyMatrixRow {
    pub date: NaiveDate,
    pub target: PriceDisplay,
    /// One cell per competitor column, in column order.
    pub competitors: Vec<DailyCell>,
    pub lowest_hotel_id: Option<Uuid>,
    pub market_average: Option<Decimal>,
    pub deviation_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyMatrix {
    pub columns: Vec<MatrixColumn>,
    pub rows: Vec<DailyMatrixRow>,
}

/// Dates × {target, competitors} matrix.
///
/// Competitor columns are the distinct competitors across all rows in
/// first-seen order, filtered and capped like the vendor grid. A competitor
/// missing from a given day renders as unavailable for that day.
pub fn build_daily_matrix(
    target: &Hotel,
    rows: &[DailyPrice],
    hotel_filter: Option<&[Uuid]>,
    max_competitors: usize,
) -> DailyMatrix {
    let currency = target.display_currency().to_string();

    let mut competitor_columns: Vec<MatrixColumn> = Vec::new();
    for comp in rows.iter().flat_map(|r| r.competitors.iter()) {
        if competitor_columns.iter().any(|c| c.hotel_id == comp.hotel_id) {
            continue;
        }
        if hotel_filter.is_some_and(|ids| !ids.contains(&comp.hotel_id)) {
            continue;
        }
        if competitor_columns.len() >= max_competitors {
            break;
        }
        competitor_columns.push(MatrixColumn {
            hotel_id: comp.hotel_id,
            name: comp.name.clone(),
            is_target: false,
        });
    }

    let matrix_rows = rows
        .iter()
        .map(|row| {
            let mut lowest: Option<LowestMarker> = None;
            consider(&mut lowest, target.id, None, row.target_price);

            let competitors = competitor_columns
                .iter()
                .map(|col| {
                    let day = row.competitors.iter().find(|c| c.hotel_id == col.hotel_id);
                    let price = day.and_then(|d| d.price);
                    consider(&mut lowest, col.hotel_id, None, price);
                    DailyCell {
                        cell: evaluate(price, row.target_price, &currency),
                        is_estimated: day.is_some_and(|d| d.is_estimated),
                    }
                })
                .collect();

            DailyMatrixRow {
                date: row.date,
                target: normalize_price(row.target_price, &currency, row.target_is_estimated),
                competitors,
                lowest_hotel_id: lowest.map(|l| l.hotel_id),
                market_average: row.market_average,
                deviation_pct: row.deviation_pct,
            }
        })
        .collect();

    let mut columns = Vec::with_capacity(competitor_columns.len() + 1);
    columns.push(MatrixColumn {
        hotel_id: target.id,
        name: target.name.clone(),
        is_target: true,
    });
    columns.extend(competitor_columns);

    DailyMatrix {
        columns,
        rows: matrix_rows,
    }
}
