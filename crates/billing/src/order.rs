//! Order-id codec: `DISBOT-<userId>-<timestamp>`.

use crate::error::BillingError;

/// Prefix every order id carries.
pub const ORDER_PREFIX: &str = "DISBOT";

/// The tuple an order id encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRef {
    pub user_id: String,
    pub issued_at: i64,
}

/// Build the order id for a purchase issued at `issued_at`.
pub fn format_order_id(user_id: &str, issued_at: i64) -> String {
    format!("{ORDER_PREFIX}-{user_id}-{issued_at}")
}

/// Parse an order id back into its tuple.
///
/// The timestamp is the segment after the last `-`, so user ids containing
/// dashes round-trip.
pub fn parse_order_id(order_id: &str) -> Result<OrderRef, BillingError> {
    let malformed = || BillingError::MalformedOrder(order_id.to_string());

    let rest = order_id
        .strip_prefix(ORDER_PREFIX)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(malformed)?;
    let (user_id, timestamp) = rest.rsplit_once('-').ok_or_else(malformed)?;
    if user_id.is_empty() {
        return Err(malformed());
    }
    let issued_at = timestamp.parse::<i64>().map_err(|_| malformed())?;
    Ok(OrderRef {
        user_id: user_id.to_string(),
        issued_at,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_shape() {
        let parsed = parse_order_id("DISBOT-usr_123-1700000000000").unwrap();
        assert_eq!(
            parsed,
            OrderRef {
                user_id: "usr_123".into(),
                issued_at: 1_700_000_000_000,
            }
        );
    }

    #[test]
    fn wrong_prefix_is_malformed() {
        assert!(matches!(
            parse_order_id("BADPREFIX-x-1"),
            Err(BillingError::MalformedOrder(_))
        ));
    }

    #[test]
    fn dashed_user_ids_round_trip() {
        let order_id = format_order_id("guild-west-42", 1_700_000_000_000);
        let parsed = parse_order_id(&order_id).unwrap();
        assert_eq!(parsed.user_id, "guild-west-42");
        assert_eq!(parsed.issued_at, 1_700_000_000_000);
    }

    #[test]
    fn rejects_structural_misses() {
        for bad in [
            "DISBOT",
            "DISBOT-",
            "DISBOT-u1",
            "DISBOT--1700000000000",
            "DISBOT-u1-not_a_number",
            "DISBOTX-u1-1",
            "",
        ] {
            assert!(
                matches!(parse_order_id(bad), Err(BillingError::MalformedOrder(_))),
                "{bad:?} should be malformed"
            );
        }
    }
}
