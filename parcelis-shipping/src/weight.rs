use parcelis_core::model::OrderSnapshot;

/// Estimated packaging weight by parcel count: small box and filler for a
/// few pieces, bigger cartons above that.
pub fn packaging_weight_grams(pieces: i32) -> u32 {
    if pieces <= 5 {
        150
    } else if pieces <= 12 {
        250
    } else {
        350
    }
}

/// Declared total weight for a shipment: sum of line weights times
/// quantities plus packaging, never less than 1 g.
pub fn total_weight_grams(order: &OrderSnapshot, pieces: i32) -> u32 {
    let items: u32 = order
        .lines
        .iter()
        .map(|line| line.weight_grams * line.quantity)
        .sum();
    (items + packaging_weight_grams(pieces)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcelis_core::model::OrderLine;

    fn order(lines: Vec<OrderLine>) -> OrderSnapshot {
        OrderSnapshot {
            order_number: "ORD-1".to_string(),
            customer_name: "Jana Novak".to_string(),
            customer_email: None,
            customer_phone: None,
            ship_street: "Dlouhá 1".to_string(),
            ship_city: "Brno".to_string(),
            ship_zip: "60200".to_string(),
            ship_country: "CZ".to_string(),
            lines,
        }
    }

    #[test]
    fn test_packaging_tiers() {
        assert_eq!(packaging_weight_grams(1), 150);
        assert_eq!(packaging_weight_grams(5), 150);
        assert_eq!(packaging_weight_grams(6), 250);
        assert_eq!(packaging_weight_grams(12), 250);
        assert_eq!(packaging_weight_grams(13), 350);
    }

    #[test]
    fn test_total_weight_includes_packaging() {
        // 80 g x 2 + 150 g x 1 = 310 g items + 150 g packaging = 460 g.
        let order = order(vec![
            OrderLine { weight_grams: 80, quantity: 2 },
            OrderLine { weight_grams: 150, quantity: 1 },
        ]);
        assert_eq!(total_weight_grams(&order, 1), 460);
    }

    #[test]
    fn test_empty_order_still_has_positive_weight() {
        let order = order(vec![]);
        assert_eq!(total_weight_grams(&order, 1), 150);
    }
}
