//! Inventory view types used by basket mutations and the checkout transaction.

use rust_decimal::Decimal;

use orderflow_core::{InventoryRecordId, LineItemId, ShopId};

/// Snapshot of an inventory record taken while adding items to a basket.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecordForBasket {
    /// Inventory record ID.
    pub id: InventoryRecordId,
    /// Product display name (for error messages).
    pub product_name: String,
    /// Owning shop.
    pub shop_id: ShopId,
    /// Shop display name (for error messages).
    pub shop_name: String,
    /// Whether the shop currently accepts orders.
    pub shop_accepts_orders: bool,
    /// Quantity on hand.
    pub quantity: i32,
    /// Listing price.
    pub price: Decimal,
}

/// A basket line item joined to its inventory record and shop, read under
/// `FOR UPDATE OF inventory_record`.
///
/// The lock is held from this read through the decrement/increment that
/// follows, which is what makes the sufficiency check race-free.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedLine {
    /// Line item ID.
    pub line_item_id: LineItemId,
    /// Locked inventory record.
    pub inventory_record_id: InventoryRecordId,
    /// Product display name (for error messages).
    pub product_name: String,
    /// Owning shop.
    pub shop_id: ShopId,
    /// Shop display name (for error messages).
    pub shop_name: String,
    /// Whether the shop currently accepts orders.
    pub shop_accepts_orders: bool,
    /// Quantity on hand at lock time.
    pub on_hand: i32,
    /// Quantity the basket requests.
    pub requested: i32,
}
