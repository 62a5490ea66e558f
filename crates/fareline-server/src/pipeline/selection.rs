use rand::Rng;

use super::record::ServiceRecord;

/// Splits the records into the single highlighted "optimal" pick and the
/// rest, both in ascending price order.
///
/// When the region carries an operator-flagged optimal product, the cheapest
/// flagged record wins (no flagged record → no optimal block). Otherwise the
/// pick is uniformly random among the records priced within
/// `cheapest × price_coeff`, which spreads repeated identical requests across
/// comparably cheap providers instead of always rewarding one of them.
pub fn split_optimal(
    mut records: Vec<ServiceRecord>,
    has_optimal_in_region: bool,
    price_coeff: f64,
) -> (Vec<ServiceRecord>, Vec<ServiceRecord>) {
    if records.is_empty() {
        return (Vec::new(), Vec::new());
    }

    records.sort_by_key(|r| r.price);

    let optimal_index = if has_optimal_in_region {
        records.iter().position(|r| r.operator.is_optimal)
    } else {
        Some(random_cheap_index(&records, price_coeff))
    };

    match optimal_index {
        None => (Vec::new(), records),
        Some(index) => {
            let optimal = records.remove(index);
            (vec![optimal], records)
        }
    }
}

/// Index of a uniformly random record within the cheap band
/// `[cheapest, cheapest × coeff]`. The cheapest record always qualifies.
fn random_cheap_index(records: &[ServiceRecord], price_coeff: f64) -> usize {
    let price_limit = f64::from(records[0].price) * price_coeff;
    let mut last_cheap = 0;
    for (index, record) in records.iter().enumerate() {
        if f64::from(record.price) <= price_limit {
            last_cheap = index;
        } else {
            break;
        }
    }
    if last_cheap == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=last_cheap)
}
