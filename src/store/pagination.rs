//! List query parsing and page windowing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::{Validate, ValidationError};

use crate::error::ParseError;
use crate::store::products::Product;

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ASC" => Some(Order::Asc),
            "DESC" => Some(Order::Desc),
            _ => None,
        }
    }
}

/// Filters and page selection for listing products.
///
/// `order` keeps the raw parameter; membership in {ASC, DESC} is checked by
/// [`Validate`], not while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct ListQuery {
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    pub limit: i64,

    #[validate(range(min = 0, message = "page must not be negative"))]
    pub page: i64,

    #[validate(custom(function = "validate_order"))]
    pub order: String,

    pub search: String,

    pub category: BTreeSet<String>,
}

fn validate_order(order: &str) -> Result<(), ValidationError> {
    if Order::parse(order).is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("order");
    err.message = Some("order must be ASC or DESC".into());
    Err(err)
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
            order: Order::Asc.as_str().to_string(),
            search: String::new(),
            category: BTreeSet::new(),
        }
    }
}

impl ListQuery {
    /// Parse a raw url query string such as `limit=5&category=a&category=b`.
    pub fn from_query_str(raw: &str) -> Result<Self, ParseError> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(raw).map_err(|e| ParseError::Malformed(e.to_string()))?;
        Self::from_pairs(&pairs)
    }

    /// Build a query from decoded key/value pairs.
    ///
    /// Single-valued parameters take their first occurrence; absent or empty
    /// values fall back to the defaults. Every `category` occurrence is kept.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ParseError> {
        let first = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
                .filter(|value| !value.is_empty())
        };

        let mut query = ListQuery::default();

        if let Some(limit) = first("limit") {
            query.limit = parse_integer("limit", limit)?;
        }
        if let Some(page) = first("page") {
            query.page = parse_integer("page", page)?;
        }
        if let Some(order) = first("order") {
            query.order = order.to_string();
        }
        if let Some(search) = first("search") {
            query.search = search.to_string();
        }

        query.category = pairs
            .iter()
            .filter(|(key, _)| key == "category")
            .map(|(_, value)| value.clone())
            .collect();

        Ok(query)
    }

    /// Resolved ordering. Anything other than DESC windows ascending.
    pub fn order(&self) -> Order {
        Order::parse(&self.order).unwrap_or(Order::Asc)
    }

    pub fn matches(&self, product: &Product) -> bool {
        if !self.search.is_empty() && !product.name.contains(&self.search) {
            return false;
        }
        if !self.category.is_empty() && !self.category.contains(&product.category) {
            return false;
        }
        true
    }

    /// Query string for the following page: the original parameters with
    /// `page` replaced, keys sorted.
    pub fn next_query(
        &self,
        params: &[(String, String)],
    ) -> Result<String, serde_urlencoded::ser::Error> {
        let mut next: Vec<(&str, String)> = params
            .iter()
            .filter(|(key, _)| key != "page")
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        next.push(("page", self.page.saturating_add(1).to_string()));
        next.sort_by(|a, b| a.0.cmp(b.0));

        serde_urlencoded::to_string(&next)
    }
}

fn parse_integer(param: &'static str, value: &str) -> Result<i64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidInteger {
        param,
        value: value.to_string(),
    })
}

/// One page of products plus the query that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResponse {
    pub limit: i64,
    pub page: i64,
    pub order: Order,
    /// Size of the whole collection, ignoring filters
    pub total: usize,
    pub data: Vec<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Window `products` (in insertion order) according to `query`.
///
/// Page bounds are derived from the unfiltered length and mirrored for DESC,
/// then applied to the filtered sequence. Bounds outside the filtered
/// sequence yield an empty page.
pub(crate) fn paginate(products: &[Product], query: &ListQuery) -> PaginatedResponse {
    let total = products.len();
    let len = total as i64;

    let mut start = query.page.saturating_sub(1).saturating_mul(query.limit);
    let mut end = start.saturating_add(query.limit).min(len);

    let order = query.order();
    if order == Order::Desc {
        (start, end) = (len.saturating_sub(end), len.saturating_sub(start));
    }

    let filtered: Vec<&Product> = products.iter().filter(|p| query.matches(p)).collect();
    let bound = filtered.len() as i64;
    let start = start.clamp(0, bound) as usize;
    let end = end.clamp(0, bound) as usize;

    let data = if start < end {
        filtered[start..end].iter().map(|p| (*p).clone()).collect()
    } else {
        Vec::new()
    };

    PaginatedResponse {
        limit: query.limit,
        page: query.page,
        order,
        total,
        data,
        next: None,
    }
}
