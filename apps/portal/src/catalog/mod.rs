pub mod handlers;
pub mod plans;
pub mod pricing;

pub use plans::{find_plan, Plan, FREE_PLAN};
pub use pricing::{format_inr, resolve_price, PriceSource};
