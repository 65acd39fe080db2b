//! The list views the back office offers and the filters each one takes

use crate::error::CoreError;
use crate::filters::{FilterField, FilterSchema};
use opsdesk_config::RealtimeConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Members,
    Products,
    Withdrawals,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::Members, ListKind::Products, ListKind::Withdrawals];

    /// URL path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Members => "members",
            ListKind::Products => "products",
            ListKind::Withdrawals => "withdrawals",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ListKind::Members => "Member List",
            ListKind::Products => "Product List",
            ListKind::Withdrawals => "Withdrawals",
        }
    }

    pub fn filter_schema(&self) -> FilterSchema {
        match self {
            ListKind::Members => FilterSchema::new(vec![
                FilterField::integer("userId", "User ID"),
                FilterField::digits("phoneLast4", "Phone (last 4)", 4),
                FilterField::text("name", "Name"),
                FilterField::text("ip", "Login IP"),
                FilterField::select("userType", "User type", &["Normal", "VIP", "Admin"]),
            ]),
            ListKind::Products => FilterSchema::new(vec![
                FilterField::integer("productId", "Product ID"),
                FilterField::text("name", "Name"),
                FilterField::select("status", "Status", &["Active", "Inactive"]),
                FilterField::decimal("minPrice", "Min price"),
                FilterField::decimal("maxPrice", "Max price"),
            ])
            .with_range("minPrice", "maxPrice"),
            ListKind::Withdrawals => FilterSchema::new(vec![
                FilterField::integer("userId", "User ID"),
                FilterField::digits("phoneLast4", "Phone (last 4)", 4),
                FilterField::text("orderNumber", "Order number"),
                FilterField::text("name", "Name"),
                FilterField::select(
                    "transactionStatus",
                    "Status",
                    &["APPROVED", "REJECTED", "PENDING"],
                ),
                FilterField::decimal("orderAmount", "Order amount"),
                FilterField::decimal("screenAmount", "Screen amount"),
            ]),
        }
    }

    /// Realtime events that invalidate this list
    pub fn realtime_events<'a>(&self, config: &'a RealtimeConfig) -> &'a [String] {
        match self {
            ListKind::Members => &config.member_events,
            ListKind::Products => &config.product_events,
            ListKind::Withdrawals => &config.withdrawal_events,
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "members" | "member" => Ok(ListKind::Members),
            "products" | "product" | "commodities" => Ok(ListKind::Products),
            "withdrawals" | "withdrawal" | "withdraw" => Ok(ListKind::Withdrawals),
            _ => Err(CoreError::UnknownList {
                name: s.to_string(),
            }),
        }
    }
}
