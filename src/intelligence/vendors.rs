use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::Offer;

/// Number of OTA columns shown before the user picks their own.
pub const DEFAULT_VISIBLE_VENDORS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorCount {
    pub name: String,
    pub count: usize,
}

pub fn vendor_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Rank every vendor seen across the target's and competitors' offers.
///
/// Names merge case-insensitively and keep their first-seen casing.
/// Ordering is by descending frequency, ties by first appearance.
pub fn aggregate_vendors<'a, I>(target_offers: &'a [Offer], competitor_offers: I) -> Vec<VendorCount>
where
    I: IntoIterator<Item = &'a [Offer]>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<VendorCount> = Vec::new();

    let all = std::iter::once(target_offers).chain(competitor_offers);
    for offers in all {
        for offer in offers {
            let key = vendor_key(&offer.vendor);
            if key.is_empty() {
                continue;
            }
            match index.get(&key) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(key, counts.len());
                    counts.push(VendorCount {
                        name: offer.vendor.trim().to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    // Vec::sort_by is stable, so equal counts keep first-seen order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

pub fn ranked_names(counts: &[VendorCount]) -> Vec<String> {
    counts.iter().map(|c| c.name.clone()).collect()
}

/// Which OTA columns the user sees.
///
/// `Default` follows the ranking; `Explicit` is exactly what the user chose,
/// including an empty choice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "vendors", rename_all = "lowercase")]
pub enum VendorSelection {
    #[default]
    Default,
    Explicit(Vec<String>),
}

impl VendorSelection {
    /// Vendor columns to render, in display order.
    pub fn visible(&self, ranked: &[String], default_count: usize) -> Vec<String> {
        match self {
            VendorSelection::Default => ranked.iter().take(default_count).cloned().collect(),
            VendorSelection::Explicit(chosen) => {
                let chosen_keys: Vec<String> = chosen.iter().map(|v| vendor_key(v)).collect();
                let mut visible: Vec<String> = ranked
                    .iter()
                    .filter(|r| chosen_keys.contains(&vendor_key(r)))
                    .cloned()
                    .collect();
                for vendor in chosen {
                    let key = vendor_key(vendor);
                    if !visible.iter().any(|v| vendor_key(v) == key) {
                        visible.push(vendor.clone());
                    }
                }
                visible
            }
        }
    }

    /// Toggle one vendor column.
    ///
    /// From `Default` the first toggle snapshots the currently visible set
    /// and applies the toggle to it, switching to `Explicit`.
    pub fn toggle(self, vendor: &str, ranked: &[String], default_count: usize) -> Self {
        let mut chosen = match self {
            VendorSelection::Default => {
                VendorSelection::Default.visible(ranked, default_count)
            }
            VendorSelection::Explicit(chosen) => chosen,
        };

        let key = vendor_key(vendor);
        let before = chosen.len();
        chosen.retain(|v| vendor_key(v) != key);
        if chosen.len() == before {
            chosen.push(vendor.trim().to_string());
        }

        VendorSelection::Explicit(chosen)
    }

    pub fn reset(self) -> Self {
        VendorSelection::Default
    }
}
