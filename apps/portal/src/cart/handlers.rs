use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{CartItem, CartView};
use crate::catalog::{find_plan, format_inr, PriceSource};
use crate::errors::AppError;
use crate::state::AppState;
use crate::validation::is_blank;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub name: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub numeric_price: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartHandoff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    pub items: Vec<CartItem>,
    pub total: u64,
    pub formatted_total: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub item_count: u64,
    pub total: u64,
}

/// GET /api/v1/cart/summary
/// Header badge data.
pub async fn handle_cart_summary(State(state): State<AppState>) -> Json<CartSummary> {
    Json(CartSummary {
        item_count: state.cart.item_count(),
        total: state.cart.total(),
    })
}

/// GET /api/v1/cart
pub async fn handle_get_cart(State(state): State<AppState>) -> Json<CartView> {
    Json(state.cart.view())
}

/// POST /api/v1/cart/items
///
/// A catalog name wins over whatever price the caller sent. Unknown names
/// carrying a price are stored as given; bare unknown names fall back to
/// the legacy price table.
pub async fn handle_add_item(
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartView>, AppError> {
    if is_blank(&req.name) {
        return Err(AppError::validation("Plan name is required"));
    }
    let name = req.name.trim();

    let items = if let Some(plan) = find_plan(name) {
        state.cart.add_or_increment(PriceSource::CatalogPlan(plan))?
    } else if req.price.is_some() || req.numeric_price.is_some() {
        let item = CartItem {
            name: name.to_string(),
            price: req.price,
            numeric_price: req.numeric_price,
            quantity: 1,
            description: req.description,
        };
        state.cart.add_or_increment(PriceSource::CartItem(&item))?
    } else {
        state.cart.add_or_increment(PriceSource::LegacyName(name))?
    };
    Ok(Json(CartView::from_items(items)))
}

/// PATCH /api/v1/cart/items/:name
pub async fn handle_update_quantity(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<QuantityRequest>,
) -> Result<Json<CartView>, AppError> {
    let items = state.cart.update_quantity(&name, req.quantity)?;
    Ok(Json(CartView::from_items(items)))
}

/// DELETE /api/v1/cart/items/:name
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CartView>, AppError> {
    let items = state.cart.remove(&name)?;
    Ok(Json(CartView::from_items(items)))
}

/// DELETE /api/v1/cart
pub async fn handle_clear_cart(State(state): State<AppState>) -> Result<Json<CartView>, AppError> {
    state.cart.clear()?;
    Ok(Json(CartView::from_items(Vec::new())))
}

/// POST /api/v1/cart/checkout
pub async fn handle_cart_checkout(
    State(state): State<AppState>,
) -> Result<Json<CartHandoff>, AppError> {
    let view = state.cart.view();
    if view.items.is_empty() {
        return Err(AppError::validation("Your cart is empty"));
    }
    Ok(Json(CartHandoff {
        redirect: state.config.checkout_terminal().redirect(),
        formatted_total: format_inr(view.total),
        total: view.total,
        items: view.items,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::fake::FakeApi;

    fn add(name: &str) -> Json<AddItemRequest> {
        Json(AddItemRequest {
            name: name.to_string(),
            price: None,
            numeric_price: None,
            description: None,
        })
    }

    #[tokio::test]
    async fn test_catalog_name_uses_catalog_price() {
        let state = AppState::for_tests(FakeApi::new());
        let Json(view) = handle_add_item(
            State(state.clone()),
            Json(AddItemRequest {
                name: "starter".into(),
                price: Some("₹1".into()),
                numeric_price: None,
                description: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(view.items[0].name, "Starter");
        assert_eq!(view.total, 19999);
    }

    #[tokio::test]
    async fn test_priced_and_legacy_items() {
        let state = AppState::for_tests(FakeApi::new());
        handle_add_item(
            State(state.clone()),
            Json(AddItemRequest {
                name: "Featured Boost".into(),
                price: Some("₹2,500".into()),
                numeric_price: None,
                description: Some("30 days".into()),
            }),
        )
        .await
        .unwrap();
        let Json(view) = handle_add_item(State(state.clone()), add("Basic")).await.unwrap();
        assert_eq!(view.total, 2500 + 1999);
        assert_eq!(view.item_count, 2);

        let Json(summary) = handle_cart_summary(State(state)).await;
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.total, 4499);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let state = AppState::for_tests(FakeApi::new());
        assert!(matches!(
            handle_add_item(State(state.clone()), add("  ")).await,
            Err(AppError::Validation(_))
        ));
        assert!(state.cart.load().is_empty());
    }

    #[tokio::test]
    async fn test_quantity_and_checkout() {
        let state = AppState::for_tests(FakeApi::new());
        handle_add_item(State(state.clone()), add("Professional")).await.unwrap();

        let Json(view) = handle_update_quantity(
            State(state.clone()),
            Path("Professional".into()),
            Json(QuantityRequest { quantity: 3 }),
        )
        .await
        .unwrap();
        assert_eq!(view.formatted_total, "₹1,19,997");

        let Json(handoff) = handle_cart_checkout(State(state.clone())).await.unwrap();
        assert_eq!(handoff.redirect.as_deref(), Some("/checkout"));
        assert_eq!(handoff.total, 119997);
        assert_eq!(handoff.items.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_refused() {
        let state = AppState::for_tests(FakeApi::new());
        handle_add_item(State(state.clone()), add("Starter")).await.unwrap();
        handle_clear_cart(State(state.clone())).await.unwrap();
        assert!(matches!(
            handle_cart_checkout(State(state)).await,
            Err(AppError::Validation(_))
        ));
    }
}
