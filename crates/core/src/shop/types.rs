use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::functions::{generate_short_id, generate_uuid, normalize_text, now_millis};

/// A shop customer. Unique per store by phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub uuid: String,
    pub store_id: String,
    pub phone: String,
    pub name: String,
    /// Lowercase, accent-free copy of `name`, used for search.
    pub normalized_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: i64,
}

impl Customer {
    pub fn new(
        store_id: impl Into<String>,
        phone: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            uuid: generate_uuid(),
            store_id: store_id.into(),
            phone: phone.into(),
            normalized_name: normalize_text(&name),
            name,
            email: None,
            created_at: now_millis(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Renames the customer, keeping the search field in sync.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.normalized_name = normalize_text(&self.name);
    }
}

/// Workflow state of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Finished,
    Deleted,
    PickedUp,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Finished => "finished",
            OrderStatus::Deleted => "deleted",
            OrderStatus::PickedUp => "picked_up",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "finished" => Some(OrderStatus::Finished),
            "deleted" => Some(OrderStatus::Deleted),
            "picked_up" => Some(OrderStatus::PickedUp),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer details copied into an order at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub name: String,
    pub phone: String,
    pub normalized_name: String,
}

impl From<&Customer> for OrderCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            normalized_name: customer.normalized_name.clone(),
        }
    }
}

/// Frame measurements in centimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDimensions {
    pub original_height: f64,
    pub original_width: f64,
    pub total_height: f64,
    pub total_width: f64,
    pub working_height: f64,
    pub working_width: f64,
}

/// A framing order. Keyed by customer and creation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub uuid: String,
    pub short_id: String,
    pub customer_uuid: String,
    pub timestamp: i64,
    pub store_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub notified: bool,
    #[serde(default)]
    pub amount_payed: f64,
    pub customer: OrderCustomer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<OrderDimensions>,
}

impl Order {
    /// Creates a pending order for `customer`, stamped with the current time.
    pub fn new(customer: &Customer, user_id: impl Into<String>) -> Self {
        Self {
            uuid: generate_uuid(),
            short_id: generate_short_id(),
            customer_uuid: customer.uuid.clone(),
            timestamp: now_millis(),
            store_id: customer.store_id.clone(),
            user_id: user_id.into(),
            user_name: None,
            status: OrderStatus::Pending,
            deleted: false,
            notified: false,
            amount_payed: 0.0,
            customer: OrderCustomer::from(customer),
            dimensions: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_short_id(mut self, short_id: impl Into<String>) -> Self {
        self.short_id = short_id.into();
        self
    }

    /// Returns a copy of the order attached to another customer.
    pub fn relinked_to(&self, customer: &Customer) -> Self {
        Self {
            customer_uuid: customer.uuid.clone(),
            store_id: customer.store_id.clone(),
            customer: OrderCustomer::from(customer),
            ..self.clone()
        }
    }
}

/// Kind of priced material or service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    Mold,
    Glass,
    Back,
    Pp,
    Fabric,
    Labour,
    Other,
}

impl PricingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::Mold => "mold",
            PricingType::Glass => "glass",
            PricingType::Back => "back",
            PricingType::Pp => "pp",
            PricingType::Fabric => "fabric",
            PricingType::Labour => "labour",
            PricingType::Other => "other",
        }
    }
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formula used to turn a list price into an item price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingFormula {
    FormulaLinear,
    FormulaLeftover,
    FormulaFitArea,
    FormulaArea,
    FormulaFitAreaM2,
    #[default]
    None,
}

/// Price for pieces up to a given size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxArea {
    pub d1: f64,
    pub d2: f64,
    pub price: f64,
}

/// A price list entry, unique per type by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPrice {
    pub id: String,
    pub uuid: String,
    #[serde(rename = "type")]
    pub pricing_type: PricingType,
    pub price: f64,
    pub description: String,
    #[serde(default)]
    pub formula: PricingFormula,
    #[serde(default)]
    pub areas: Vec<MaxArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_d1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_d2: Option<f64>,
}

impl ListPrice {
    pub fn new(
        pricing_type: PricingType,
        id: impl Into<String>,
        price: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            uuid: generate_uuid(),
            pricing_type,
            price,
            description: description.into(),
            formula: PricingFormula::None,
            areas: Vec::new(),
            max_d1: None,
            max_d2: None,
        }
    }
}

/// Metadata of a file attached to an order. The content lives elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub order_uuid: String,
    pub file_uuid: String,
    pub name: String,
    pub content_type: String,
    pub created_at: i64,
}

impl FileRecord {
    pub fn new(
        order_uuid: impl Into<String>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            order_uuid: order_uuid.into(),
            file_uuid: generate_uuid(),
            name: name.into(),
            content_type: content_type.into(),
            created_at: now_millis(),
        }
    }
}

/// One recorded change of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAuditTrailEntry {
    pub order_uuid: String,
    pub timestamp: i64,
    pub user_id: String,
    /// What changed, e.g. `status` or `amountPayed`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl OrderAuditTrailEntry {
    pub fn new(
        order_uuid: impl Into<String>,
        user_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            order_uuid: order_uuid.into(),
            timestamp: now_millis(),
            user_id: user_id.into(),
            kind: kind.into(),
            old_value: None,
            new_value: None,
        }
    }

    pub fn with_change(mut self, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }
}

/// One priced component of a calculated item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedItemPart {
    pub price: f64,
    pub quantity: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

/// Price breakdown of an order. One per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedItem {
    pub order_uuid: String,
    #[serde(default)]
    pub discount: f64,
    pub parts: Vec<CalculatedItemPart>,
    pub total: f64,
    pub quantity: u32,
}

/// A per-store configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub store_id: String,
    pub id: String,
    pub value: Value,
}
