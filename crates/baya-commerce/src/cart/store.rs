//! The cart store: line items, derived totals, discount and stock cache,
//! persisted as one snapshot after every mutation.

use std::collections::BTreeMap;

use baya_store::KvStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cart::{compute_discount, DiscountRecord, DiscountRetention, StockOracle, StockStatus};
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};

/// Storage key holding the cart snapshot.
pub const CART_KEY: &str = "cart";

/// Snapshot format version. Snapshots with another version are discarded.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// The product fields a line item is created from.
#[derive(Debug, Clone, PartialEq)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    /// Absolute image URL.
    pub image: String,
}

impl CartProduct {
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            image: image.into(),
        }
    }
}

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product id, unique within the cart.
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub image: String,
    /// Always at least one.
    pub quantity: u32,
}

impl LineItem {
    fn from_product(product: CartProduct, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name,
            unit_price: product.unit_price,
            image: product.image,
            quantity,
        }
    }

    /// `unit_price * quantity`.
    pub fn line_total(&self) -> Result<Money, CommerceError> {
        self.unit_price
            .try_multiply(i64::from(self.quantity))
            .ok_or(CommerceError::Overflow)
    }
}

/// Full cart state.
///
/// `original_total` is always the sum of the line totals and `total` is
/// `original_total` less the active discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    /// Insertion order is display order.
    pub items: Vec<LineItem>,
    pub total: Money,
    pub original_total: Money,
    pub discount: Option<DiscountRecord>,
    /// Last oracle answer per product still in the cart.
    #[serde(default)]
    pub stock_status: BTreeMap<ProductId, StockStatus>,
    pub currency: Currency,
}

impl CartState {
    pub fn new(currency: Currency) -> Self {
        Self {
            items: Vec::new(),
            total: Money::zero(currency),
            original_total: Money::zero(currency),
            discount: None,
            stock_status: BTreeMap::new(),
            currency,
        }
    }

    pub fn item(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }

    /// Re-derive totals and the discount amount, and drop stock entries for
    /// products no longer in the cart.
    fn recompute(&mut self) -> Result<(), CommerceError> {
        let mut subtotal = Money::zero(self.currency);
        for item in &self.items {
            subtotal = subtotal
                .try_add(&item.line_total()?)
                .ok_or(CommerceError::Overflow)?;
        }
        self.original_total = subtotal;

        match self.discount.as_mut() {
            Some(discount) => {
                let (total, amount) = compute_discount(subtotal, discount.percentage);
                discount.amount = amount;
                self.total = total;
            }
            None => self.total = subtotal,
        }

        let items = &self.items;
        self.stock_status
            .retain(|id, _| items.iter().any(|item| &item.id == id));
        Ok(())
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new(Currency::default())
    }
}

/// What gets written under [`CART_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub version: u32,
    pub state: CartState,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    state: &'a CartState,
}

fn validate_quantity(quantity: i64) -> Result<u32, CommerceError> {
    if quantity < 1 {
        return Err(CommerceError::InvalidQuantity(quantity));
    }
    if quantity > MAX_QUANTITY_PER_ITEM {
        return Err(CommerceError::QuantityExceedsLimit(
            quantity,
            MAX_QUANTITY_PER_ITEM,
        ));
    }
    u32::try_from(quantity).map_err(|_| CommerceError::Overflow)
}

/// Single source of truth for cart contents and totals.
///
/// Every mutation builds the next state, persists it, and only then makes it
/// current: a failed write leaves both memory and storage on the previous
/// snapshot.
pub struct CartStore<S: KvStore> {
    storage: S,
    state: CartState,
    retention: DiscountRetention,
}

impl<S: KvStore> CartStore<S> {
    /// Rehydrate from `storage`, or start empty.
    ///
    /// An unreadable or foreign-version snapshot is logged and ignored.
    pub fn load(storage: S) -> Self {
        let state = match storage.get::<CartSnapshot>(CART_KEY) {
            Ok(Some(snapshot)) if snapshot.version == SNAPSHOT_VERSION => {
                let mut state = snapshot.state;
                match state.recompute() {
                    Ok(()) => state,
                    Err(e) => {
                        warn!(error = %e, "discarding inconsistent cart snapshot");
                        CartState::default()
                    }
                }
            }
            Ok(Some(snapshot)) => {
                warn!(version = snapshot.version, "discarding cart snapshot with unknown version");
                CartState::default()
            }
            Ok(None) => CartState::default(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable cart snapshot");
                CartState::default()
            }
        };
        debug!(items = state.items.len(), "cart loaded");
        Self {
            storage,
            state,
            retention: DiscountRetention::default(),
        }
    }

    /// Set the discount retention policy.
    pub fn with_retention(mut self, retention: DiscountRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> DiscountRetention {
        self.retention
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn items(&self) -> &[LineItem] {
        &self.state.items
    }

    pub fn item(&self, id: &ProductId) -> Option<&LineItem> {
        self.state.item(id)
    }

    pub fn total(&self) -> Money {
        self.state.total
    }

    pub fn original_total(&self) -> Money {
        self.state.original_total
    }

    pub fn discount(&self) -> Option<&DiscountRecord> {
        self.state.discount.as_ref()
    }

    pub fn stock_status(&self, id: &ProductId) -> Option<&StockStatus> {
        self.state.stock_status.get(id)
    }

    pub fn item_count(&self) -> u64 {
        self.state.item_count()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// Returns the line's new quantity. Stock is not consulted; see
    /// [`CartStore::add_checked`].
    pub fn add_item(&mut self, product: CartProduct, quantity: i64) -> Result<u32, CommerceError> {
        let quantity = validate_quantity(quantity)?;
        let (next, new_quantity) = self.with_added(product, quantity)?;
        self.commit(next)?;
        Ok(new_quantity)
    }

    /// Remove a line and its cached stock status.
    pub fn remove_item(&mut self, id: &ProductId) -> Result<LineItem, CommerceError> {
        let mut next = self.state.clone();
        let index = next
            .items
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(|| CommerceError::ItemNotInCart(id.to_string()))?;
        let removed = next.items.remove(index);
        next.stock_status.remove(id);

        if self.retention == DiscountRetention::InvalidateOnRemoval && next.discount.is_some() {
            info!(product = %id, "discount invalidated by item removal");
            next.discount = None;
        }

        self.commit(next)?;
        Ok(removed)
    }

    /// Replace a line's quantity.
    ///
    /// Refused without any write when `quantity` is below one or above the
    /// last known available stock for the product.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) -> Result<(), CommerceError> {
        let quantity = validate_quantity(quantity)?;
        if self.state.item(id).is_none() {
            return Err(CommerceError::ItemNotInCart(id.to_string()));
        }
        if let Some(status) = self.state.stock_status.get(id) {
            if quantity > status.available {
                return Err(CommerceError::InsufficientStock {
                    product_id: id.to_string(),
                    requested: quantity,
                    available: status.available,
                    message: None,
                });
            }
        }

        let mut next = self.state.clone();
        set_quantity(&mut next, id, quantity);
        self.commit(next)
    }

    /// Reset to an empty cart and remove the snapshot.
    pub fn clear(&mut self) -> Result<(), CommerceError> {
        self.storage.delete(CART_KEY)?;
        self.state = CartState::new(self.state.currency);
        info!("cart cleared");
        Ok(())
    }

    /// Install `discount`, replacing any active one.
    pub fn apply_discount(&mut self, discount: DiscountRecord) -> Result<(), CommerceError> {
        if discount.original_total != self.state.original_total {
            debug!(
                given = discount.original_total.amount_cents,
                current = self.state.original_total.amount_cents,
                "discount computed against a stale subtotal, re-deriving"
            );
        }
        let mut next = self.state.clone();
        next.discount = Some(DiscountRecord::new(discount.percentage, discount.original_total));
        if let (Some(installed), Some(code)) = (next.discount.as_mut(), discount.code) {
            installed.code = Some(code);
        }
        self.commit(next)
    }

    /// Drop the active discount. Returns whether one was active.
    pub fn remove_discount(&mut self) -> Result<bool, CommerceError> {
        if self.state.discount.is_none() {
            return Ok(false);
        }
        let mut next = self.state.clone();
        next.discount = None;
        self.commit(next)?;
        Ok(true)
    }

    /// Cache an oracle answer for a product in the cart.
    ///
    /// Answers for products not in the cart are ignored and return `false`.
    pub fn record_stock(&mut self, id: &ProductId, status: StockStatus) -> Result<bool, CommerceError> {
        if self.state.item(id).is_none() {
            return Ok(false);
        }
        let mut next = self.state.clone();
        next.stock_status.insert(id.clone(), status);
        self.commit(next)?;
        Ok(true)
    }

    /// Add after asking the oracle about the resulting line quantity.
    pub async fn add_checked(
        &mut self,
        oracle: &dyn StockOracle,
        product: CartProduct,
        quantity: i64,
    ) -> Result<StockStatus, CommerceError> {
        let quantity = validate_quantity(quantity)?;
        let id = product.id.clone();
        let existing = self.state.item(&id).map(|i| i.quantity).unwrap_or(0);
        let target = existing.checked_add(quantity).ok_or(CommerceError::Overflow)?;

        let status = oracle.check(&id, target).await?;
        if !status.is_available {
            self.record_stock(&id, status.clone())?;
            return Err(status.rejection(&id, target));
        }

        let (mut next, _) = self.with_added(product, quantity)?;
        next.stock_status.insert(id, status.clone());
        self.commit(next)?;
        Ok(status)
    }

    /// Change a line's quantity after asking the oracle.
    pub async fn update_checked(
        &mut self,
        oracle: &dyn StockOracle,
        id: &ProductId,
        quantity: i64,
    ) -> Result<StockStatus, CommerceError> {
        let quantity = validate_quantity(quantity)?;
        if self.state.item(id).is_none() {
            return Err(CommerceError::ItemNotInCart(id.to_string()));
        }

        let status = oracle.check(id, quantity).await?;
        if !status.is_available {
            self.record_stock(id, status.clone())?;
            return Err(status.rejection(id, quantity));
        }

        let mut next = self.state.clone();
        next.stock_status.insert(id.clone(), status.clone());
        set_quantity(&mut next, id, quantity);
        self.commit(next)?;
        Ok(status)
    }

    /// Re-check every line against the oracle.
    ///
    /// Returns the products whose current quantity can no longer be served.
    pub async fn refresh_stock(
        &mut self,
        oracle: &dyn StockOracle,
    ) -> Result<Vec<ProductId>, CommerceError> {
        if self.state.items.is_empty() {
            return Ok(Vec::new());
        }
        let mut statuses = BTreeMap::new();
        for item in &self.state.items {
            let status = oracle.check(&item.id, item.quantity).await?;
            statuses.insert(item.id.clone(), status);
        }

        let unavailable: Vec<ProductId> = statuses
            .iter()
            .filter(|(_, s)| !s.is_available)
            .map(|(id, _)| id.clone())
            .collect();

        let mut next = self.state.clone();
        next.stock_status = statuses;
        self.commit(next)?;
        if !unavailable.is_empty() {
            warn!(count = unavailable.len(), "cart lines exceed available stock");
        }
        Ok(unavailable)
    }

    fn with_added(
        &self,
        product: CartProduct,
        quantity: u32,
    ) -> Result<(CartState, u32), CommerceError> {
        if product.unit_price.is_negative() {
            return Err(CommerceError::ValidationError(format!(
                "negative price for {}",
                product.id
            )));
        }

        let mut next = self.state.clone();
        let new_quantity = match next.items.iter_mut().find(|i| i.id == product.id) {
            Some(existing) => {
                let merged = i64::from(existing.quantity) + i64::from(quantity);
                existing.quantity = validate_quantity(merged)?;
                existing.quantity
            }
            None => {
                next.items.push(LineItem::from_product(product, quantity));
                quantity
            }
        };
        Ok((next, new_quantity))
    }

    fn commit(&mut self, mut next: CartState) -> Result<(), CommerceError> {
        next.recompute()?;
        self.storage.set(
            CART_KEY,
            &SnapshotRef {
                version: SNAPSHOT_VERSION,
                state: &next,
            },
        )?;
        self.state = next;
        Ok(())
    }
}

fn set_quantity(state: &mut CartState, id: &ProductId, quantity: u32) {
    if let Some(item) = state.items.iter_mut().find(|i| &i.id == id) {
        item.quantity = quantity;
    }
}
