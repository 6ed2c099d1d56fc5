//! Framing shop domain: entities and the collections that store them.

mod functions;
mod types;

pub mod tables;

pub use functions::{generate_short_id, generate_uuid, normalize_text, now_millis, SHORT_ID_LEN};
pub use types::{
    CalculatedItem, CalculatedItemPart, ConfigEntry, Customer, FileRecord, ListPrice, MaxArea,
    Order, OrderAuditTrailEntry, OrderCustomer, OrderDimensions, OrderStatus, PricingFormula,
    PricingType,
};
