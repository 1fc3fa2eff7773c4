//! Query parameters, filtering, sorting and pagination for list endpoints

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Query parameters for pagination and filtering
///
/// # Example
/// ```text
/// GET /api/expenses?page=2&limit=10
/// GET /api/expenses?filter={"category": "rent"}
/// GET /api/orders?filter={"amount>": 10000}&sort=order_date:desc
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Filters as JSON object
    ///
    /// - Exact match: `{"field": "value"}`
    /// - Comparison: `{"field>": value, "field<": value, "field>=": value, "field<=": value}`
    pub filter: Option<String>,

    /// Sort field and direction: `field`, `field:asc` or `field:desc`
    pub sort: Option<String>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            filter: None,
            sort: None,
        }
    }
}

impl QueryParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, clamped to 1..=100
    pub fn limit(&self) -> usize {
        self.limit.clamp(1, 100)
    }

    /// Parse filter JSON string into Value
    pub fn filter_value(&self) -> Option<Value> {
        self.filter
            .as_ref()
            .and_then(|s| serde_json::from_str(s).ok())
    }

    /// Filter, sort and paginate serialized records
    pub fn apply(&self, records: Vec<Value>) -> PaginatedResponse<Value> {
        let mut records = match self.filter_value() {
            Some(filter) => apply_filters(records, &filter),
            None => records,
        };
        if let Some(sort) = &self.sort {
            apply_sort(&mut records, sort);
        }
        paginate(records, self.page(), self.limit())
    }
}

/// Paginated response structure
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: usize,
    pub limit: usize,
    /// Total number of items (after filters)
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}

/// Slice one page out of `items`
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> PaginatedResponse<T> {
    let pagination = PaginationMeta::new(page, limit, items.len());
    let start = (pagination.page - 1).saturating_mul(pagination.limit);
    let data = items
        .into_iter()
        .skip(start)
        .take(pagination.limit)
        .collect();
    PaginatedResponse { data, pagination }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[derive(Clone, Copy)]
enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
        }
    }
}

/// Split `amount>=` into the field and its comparison
fn parse_condition(key: &str) -> (&str, Option<Comparison>) {
    if let Some(field) = key.strip_suffix(">=") {
        (field, Some(Comparison::Gte))
    } else if let Some(field) = key.strip_suffix("<=") {
        (field, Some(Comparison::Lte))
    } else if let Some(field) = key.strip_suffix('>') {
        (field, Some(Comparison::Gt))
    } else if let Some(field) = key.strip_suffix('<') {
        (field, Some(Comparison::Lt))
    } else {
        (key, None)
    }
}

/// Keep records matching every condition of a JSON filter object
pub fn apply_filters(records: Vec<Value>, filter: &Value) -> Vec<Value> {
    let Some(conditions) = filter.as_object() else {
        return records;
    };

    records
        .into_iter()
        .filter(|record| {
            conditions.iter().all(|(key, expected)| {
                let (field, comparison) = parse_condition(key);
                let actual = record.get(field);
                match comparison {
                    None => actual == Some(expected),
                    Some(cmp) => actual
                        .and_then(|actual| compare_values(actual, expected))
                        .is_some_and(|ordering| cmp.holds(ordering)),
                }
            })
        })
        .collect()
}

/// Sort records in place by `field[:asc|:desc]`; missing fields sort last
pub fn apply_sort(records: &mut [Value], sort: &str) {
    let (field, descending) = match sort.split_once(':') {
        Some((field, dir)) => (field, dir.eq_ignore_ascii_case("desc")),
        None => (sort, false),
    };

    records.sort_by(|a, b| match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y).unwrap_or(Ordering::Equal);
            if descending { ord.reverse() } else { ord }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
