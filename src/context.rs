//! Per-call evaluation context: the transaction being scored and its owner.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{catalog::USER_PREFIX, value::Value};

/// Payment channel of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Web,
    Mobile,
    Pos,
    Other,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Web => "WEB",
            Channel::Mobile => "MOBILE",
            Channel::Pos => "POS",
            Channel::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Transaction attributes as received from the decision pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub merchant_category_code: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Money amounts stay integral when they are whole, otherwise become floats.
fn decimal_value(d: Decimal) -> Value {
    if d.is_integer()
        && let Some(i) = d.to_i64()
    {
        return Value::Integer(i);
    }
    d.to_f64().map(Value::Float).unwrap_or(Value::Null)
}

impl From<&TransactionRecord> for Value {
    fn from(tx: &TransactionRecord) -> Self {
        let location = tx.location.as_ref().map(|loc| {
            Value::object([
                ("country", Value::from(loc.country.as_str())),
                ("city", Value::from(loc.city.clone())),
                ("latitude", Value::from(loc.latitude)),
                ("longitude", Value::from(loc.longitude)),
            ])
        });

        Value::object([
            ("amount", decimal_value(tx.amount)),
            ("currency", Value::from(tx.currency.as_str())),
            ("merchantId", Value::from(tx.merchant_id.clone())),
            ("merchantCategoryCode", Value::from(tx.merchant_category_code.clone())),
            ("ipAddress", Value::from(tx.ip_address.clone())),
            ("deviceId", Value::from(tx.device_id.clone())),
            ("channel", Value::from(tx.channel.map(|c| c.as_str()))),
            ("location", Value::from(location)),
        ])
    }
}

impl From<&UserRecord> for Value {
    fn from(user: &UserRecord) -> Self {
        Value::object([
            ("age", Value::from(user.age.map(i64::from))),
            ("region", Value::from(user.region.clone())),
        ])
    }
}

/// The two attribute mappings a single evaluation reads from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    pub transaction: Value,
    pub user: Value,
}

impl EvalContext {
    pub fn new(transaction: Value, user: Value) -> Self {
        EvalContext { transaction, user }
    }

    pub fn from_json(transaction: serde_json::Value, user: serde_json::Value) -> Self {
        EvalContext::new(transaction.into(), user.into())
    }

    pub fn from_records(transaction: &TransactionRecord, user: &UserRecord) -> Self {
        EvalContext::new(transaction.into(), user.into())
    }

    /// Looks up a field by its dotted name.
    ///
    /// `user.`-prefixed names read the user mapping with the prefix removed.
    /// Other dotted names read one level of nesting in the transaction
    /// (`location.country` is `transaction["location"]["country"]`). Missing
    /// keys, non-object intermediates and nulls all resolve to `None`.
    pub fn resolve(&self, name: &str) -> Option<&Value> {
        let found = if let Some(key) = name.strip_prefix(USER_PREFIX) {
            self.user.get(key)
        } else if let Some((root, sub)) = name.split_once('.') {
            self.transaction.get(root).and_then(|nested| nested.get(sub))
        } else {
            self.transaction.get(name)
        };
        found.filter(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_user_and_nested_fields() {
        let ctx = EvalContext::from_json(
            json!({"amount": 10, "location": {"country": "RU"}}),
            json!({"age": 20, "region": null}),
        );
        assert_eq!(ctx.resolve("amount"), Some(&Value::Integer(10)));
        assert_eq!(ctx.resolve("location.country"), Some(&Value::from("RU")));
        assert_eq!(ctx.resolve("user.age"), Some(&Value::Integer(20)));
        assert_eq!(ctx.resolve("user.region"), None);
        assert_eq!(ctx.resolve("location.city"), None);
        assert_eq!(ctx.resolve("amount.value"), None);
    }

    #[test]
    fn records_convert_into_context() {
        let tx: TransactionRecord = serde_json::from_value(json!({
            "amount": "15000.50",
            "currency": "RUB",
            "channel": "WEB",
            "location": {"country": "RU", "city": "Moscow"}
        }))
        .unwrap();
        let user = UserRecord {
            age: Some(19),
            region: Some("EU".into()),
        };

        let ctx = EvalContext::from_records(&tx, &user);
        assert_eq!(ctx.resolve("amount"), Some(&Value::Float(15000.5)));
        assert_eq!(ctx.resolve("channel"), Some(&Value::from("WEB")));
        assert_eq!(ctx.resolve("location.city"), Some(&Value::from("Moscow")));
        assert_eq!(ctx.resolve("merchantId"), None);
        assert_eq!(ctx.resolve("user.age"), Some(&Value::Integer(19)));
    }

    #[test]
    fn whole_amounts_stay_integral() {
        assert_eq!(decimal_value(Decimal::new(15000, 0)), Value::Integer(15000));
    }
}
