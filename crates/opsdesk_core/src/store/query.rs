//! Collection queries and their in-process evaluation.
//!
//! # Responsibility
//! - Describe equality/range filters, ordering and limits over one
//!   collection.
//! - Evaluate a query over a set of documents with document-store semantics.
//!
//! # Invariants
//! - A filter on a missing field never matches.
//! - Filters never compare values of different kinds (no implicit coercion).
//! - Sorting is a total order: mixed kinds order by kind rank.
//! - Ordered queries drop documents that lack the order field.
//! - Ordering ties break by document path, ascending.

use crate::model::document::{
    decode_reference, decode_timestamp, encode_timestamp, is_reference_object,
    is_timestamp_object, DocPath, Document,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        doc.field(&self.field)
            .and_then(|actual| compare_values(actual, &self.value))
            .is_some_and(|ordering| self.op.accepts(ordering))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Query over a single collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_range(field, FilterOp::Eq, value)
    }

    /// Equality on a reference field.
    pub fn where_ref(self, field: impl Into<String>, path: &DocPath) -> Self {
        self.where_range(field, FilterOp::Eq, path.to_reference())
    }

    pub fn where_range(
        mut self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn where_timestamp(
        self,
        field: impl Into<String>,
        op: FilterOp,
        value: DateTime<Utc>,
    ) -> Self {
        self.where_range(field, op, encode_timestamp(value))
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Same filters and limit, no ordering.
    pub fn without_order(&self) -> Self {
        Self {
            order: None,
            ..self.clone()
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.path.collection() == self.collection
            && self.filters.iter().all(|filter| filter.matches(doc))
    }

    /// Filters, orders and limits `docs`.
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched = docs
            .into_iter()
            .filter(|doc| self.matches(doc))
            .collect::<Vec<_>>();

        match &self.order {
            Some(order) => {
                matched.retain(|doc| doc.field(&order.field).is_some());
                sort_documents(&mut matched, order);
            }
            None => matched.sort_by(|left, right| left.path.cmp(&right.path)),
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Sorts documents by `order`; documents lacking the field go last.
pub fn sort_documents(docs: &mut [Document], order: &OrderBy) {
    docs.sort_by(|left, right| {
        let by_field = match (left.field(&order.field), right.field(&order.field)) {
            (Some(a), Some(b)) => {
                let ordering = order_values(a, b);
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_field.then_with(|| left.path.cmp(&right.path))
    });
}

/// Sort position of one stored value.
///
/// Kinds rank null < bool < number < timestamp < string < reference < other;
/// values only compare within their kind.
#[derive(Debug, Clone, PartialEq)]
enum SortKey<'v> {
    Null,
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(&'v str),
    Reference(DocPath),
    Other(String),
}

impl<'v> SortKey<'v> {
    fn of(value: &'v Value) -> Self {
        if is_reference_object(value) {
            return decode_reference(value)
                .map(Self::Reference)
                .unwrap_or_else(|| Self::Other(value.to_string()));
        }
        if is_timestamp_object(value) {
            return decode_timestamp(value)
                .map(Self::Timestamp)
                .unwrap_or_else(|| Self::Other(value.to_string()));
        }
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => Self::Number(number.as_f64().unwrap_or(0.0)),
            Value::String(raw) => match DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(instant) => Self::Timestamp(instant.with_timezone(&Utc)),
                Err(_) => Self::Text(raw.as_str()),
            },
            Value::Array(_) | Value::Object(_) => Self::Other(value.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Timestamp(_) => 3,
            Self::Text(_) => 4,
            Self::Reference(_) => 5,
            Self::Other(_) => 6,
        }
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Reference(a), Self::Reference(b)) => a.cmp(b),
            (Self::Other(a), Self::Other(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Total order over stored values, used for sorting.
///
/// Unlike [`compare_values`], values of different kinds still order, by kind.
pub fn order_values(left: &Value, right: &Value) -> Ordering {
    SortKey::of(left).total_cmp(&SortKey::of(right))
}

/// Compares two stored values of the same kind.
///
/// References compare by path and timestamps by instant, whichever encoding
/// either side uses. Returns `None` for values of different kinds.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    if is_reference_object(left) || is_reference_object(right) {
        return Some(decode_reference(left)?.cmp(&decode_reference(right)?));
    }
    if is_timestamp_object(left) || is_timestamp_object(right) {
        return Some(decode_timestamp(left)?.cmp(&decode_timestamp(right)?));
    }

    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_values, order_values, sort_documents, Direction, FilterOp, OrderBy, Query};
    use crate::model::document::{encode_timestamp, DocPath, Document};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::cmp::Ordering;

    fn doc(id: &str, value: serde_json::Value) -> Document {
        Document::from_value(DocPath::new("bookings", id).unwrap(), value).unwrap()
    }

    #[test]
    fn mixed_kinds_never_compare() {
        assert_eq!(compare_values(&json!(5), &json!("5")), None);
        assert_eq!(compare_values(&json!(5), &json!(5.0)), Some(Ordering::Equal));
        assert_eq!(
            compare_values(&json!("customer/c1"), &json!({"$ref": "customer/c1"})),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn timestamps_compare_across_encodings() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            compare_values(&json!("2024-01-02T03:04:05Z"), &encode_timestamp(instant)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn ordered_query_drops_missing_field_and_breaks_ties_by_path() {
        let docs = vec![
            doc("b3", json!({"amount": 10})),
            doc("b1", json!({"amount": 10})),
            doc("b2", json!({"amount": 30})),
            doc("b4", json!({})),
        ];
        let result = Query::collection("bookings")
            .order_by("amount", Direction::Descending)
            .apply(docs);
        let ids = result.iter().map(Document::id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b2", "b1", "b3"]);
    }

    #[test]
    fn range_filters_and_limit() {
        let docs = (1..=5)
            .map(|n| doc(&format!("b{n}"), json!({"amount": n * 100})))
            .collect::<Vec<_>>();
        let result = Query::collection("bookings")
            .where_range("amount", FilterOp::Gte, 200)
            .where_range("amount", FilterOp::Lt, 500)
            .limit(2)
            .apply(docs);
        let ids = result.iter().map(Document::id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b2", "b3"]);
    }

    #[test]
    fn sort_orders_mixed_kinds_by_rank() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(order_values(&json!(5), &json!("5")), Ordering::Less);
        assert_eq!(order_values(&json!("TBD"), &encode_timestamp(instant)), Ordering::Greater);
        assert_eq!(
            order_values(&json!("2024-05-01T00:00:00Z"), &encode_timestamp(instant)),
            Ordering::Equal
        );
        assert_eq!(order_values(&json!(null), &json!(false)), Ordering::Less);
    }

    #[test]
    fn sort_survives_mixed_date_encodings() {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let mut docs = (0..64)
            .map(|n| {
                let at = base + chrono::Duration::days(n * 7 % 53);
                let value = match n % 3 {
                    0 => encode_timestamp(at),
                    1 => json!("TBD"),
                    _ => json!(at.to_rfc3339()),
                };
                doc(&format!("b{n:02}"), json!({ "booking_date": value }))
            })
            .collect::<Vec<_>>();
        let order = OrderBy {
            field: "booking_date".to_string(),
            direction: Direction::Descending,
        };
        sort_documents(&mut docs, &order);

        // Strings that are not timestamps rank above every timestamp.
        let undated = docs.iter().take_while(|d| d.field("booking_date") == Some(&json!("TBD")));
        assert_eq!(undated.count(), 21);
        for pair in docs.windows(2) {
            let left = pair[0].field("booking_date").unwrap();
            let right = pair[1].field("booking_date").unwrap();
            assert_ne!(order_values(left, right), Ordering::Less);
        }
    }
}
