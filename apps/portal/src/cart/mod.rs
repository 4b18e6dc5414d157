//! Persisted cart of subscription plans.
//!
//! The storage key is the single source of truth. Every read goes back to
//! storage; every write persists first and then publishes `cartUpdated` so
//! other observers reload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{format_inr, resolve_price, PriceSource};
use crate::storage::{KeyValueStore, StorageError, CART_KEY};
use crate::sync::{PortalEvent, SyncChannel};

pub mod handlers;

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default)]
    pub numeric_price: Option<u64>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CartItem {
    /// Builds a fresh single-unit item, resolving the numeric price now.
    pub fn from_source(source: PriceSource<'_>) -> Self {
        let numeric_price = Some(resolve_price(source));
        match source {
            PriceSource::CatalogPlan(plan) => Self {
                name: plan.name.to_string(),
                price: Some(plan.price.to_string()),
                numeric_price,
                quantity: 1,
                description: Some(plan.description.to_string()),
            },
            PriceSource::CartItem(item) => Self {
                name: item.name.clone(),
                price: item.price.clone(),
                numeric_price,
                quantity: 1,
                description: item.description.clone(),
            },
            PriceSource::LegacyName(name) => Self {
                name: name.to_string(),
                price: None,
                numeric_price,
                quantity: 1,
                description: None,
            },
        }
    }

    pub fn unit_price(&self) -> u64 {
        resolve_price(PriceSource::CartItem(self))
    }

    pub fn line_total(&self) -> u64 {
        self.unit_price().saturating_mul(u64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u64,
    pub total: u64,
    pub formatted_total: String,
}

impl CartView {
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let total = total_of(&items);
        Self {
            item_count: count_of(&items),
            formatted_total: format_inr(total),
            total,
            items,
        }
    }
}

pub fn total_of(items: &[CartItem]) -> u64 {
    items.iter().map(CartItem::line_total).fold(0, u64::saturating_add)
}

pub fn count_of(items: &[CartItem]) -> u64 {
    items
        .iter()
        .map(|i| u64::from(i.quantity))
        .fold(0, u64::saturating_add)
}

#[derive(Clone)]
pub struct CartStore {
    storage: Arc<dyn KeyValueStore>,
    sync: SyncChannel,
}

impl CartStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, sync: SyncChannel) -> Self {
        Self { storage, sync }
    }

    /// Never fails: a missing key, unreadable storage or malformed JSON all
    /// yield an empty cart.
    pub fn load(&self) -> Vec<CartItem> {
        let raw = match self.storage.get(CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read cart from storage: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CartItem>>(&raw) {
            Ok(items) => normalize(items),
            Err(e) => {
                warn!("Ignoring malformed cart in storage: {e}");
                Vec::new()
            }
        }
    }

    /// An empty cart removes the key rather than writing `[]`.
    pub fn save(&self, items: &[CartItem]) -> Result<(), StorageError> {
        if items.is_empty() {
            self.storage.remove(CART_KEY)?;
        } else {
            // Vec<CartItem> of plain strings and integers cannot fail to serialize
            let json = serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string());
            self.storage.set(CART_KEY, &json)?;
        }
        self.sync.publish(PortalEvent::CartUpdated);
        Ok(())
    }

    pub fn add_or_increment(&self, source: PriceSource<'_>) -> Result<Vec<CartItem>, StorageError> {
        let mut items = self.load();
        let incoming = CartItem::from_source(source);

        match items.iter_mut().find(|i| i.name == incoming.name) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(1);
                info!("Cart: {} quantity now {}", existing.name, existing.quantity);
            }
            None => {
                info!("Cart: added {}", incoming.name);
                items.push(incoming);
            }
        }

        self.save(&items)?;
        Ok(items)
    }

    /// Quantities below one remove the item. Unknown names leave the cart untouched.
    pub fn update_quantity(
        &self,
        name: &str,
        new_quantity: i64,
    ) -> Result<Vec<CartItem>, StorageError> {
        if new_quantity < 1 {
            return self.remove(name);
        }

        let mut items = self.load();
        let Some(item) = items.iter_mut().find(|i| i.name == name) else {
            return Ok(items);
        };
        item.quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        self.save(&items)?;
        Ok(items)
    }

    pub fn remove(&self, name: &str) -> Result<Vec<CartItem>, StorageError> {
        let mut items = self.load();
        let before = items.len();
        items.retain(|i| i.name != name);
        if items.len() == before {
            return Ok(items);
        }

        info!("Cart: removed {name}");
        self.save(&items)?;
        Ok(items)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.save(&[])
    }

    pub fn total(&self) -> u64 {
        total_of(&self.load())
    }

    pub fn item_count(&self) -> u64 {
        count_of(&self.load())
    }

    pub fn view(&self) -> CartView {
        CartView::from_items(self.load())
    }
}

/// Collapses duplicate names and zero quantities left by older writers.
fn normalize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut out: Vec<CartItem> = Vec::with_capacity(items.len());
    for mut item in items {
        item.quantity = item.quantity.max(1);
        match out.iter_mut().find(|i| i.name == item.name) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => out.push(item),
        }
    }
    out
}
