use serde::Serialize;

use super::pricing::{resolve_price, PriceSource};

/// Per-plan usage limits. Display and client-side gating only; the backend
/// is the authority.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    /// `None` means unlimited.
    pub max_jobs: Option<u32>,
    pub max_cv_views: Option<u32>,
    pub featured_jobs: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: &'static str,
    pub price: &'static str,
    pub period: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub popular: bool,
    #[serde(flatten)]
    pub limits: PlanLimits,
}

impl Plan {
    pub fn resolved_price(&self) -> u64 {
        resolve_price(PriceSource::CatalogPlan(self))
    }

    pub fn is_paid(&self) -> bool {
        self.resolved_price() > 0
    }

    /// Custom-priced plans go through the sales enquiry form instead of checkout.
    pub fn is_contact_sales(&self) -> bool {
        self.price == "Custom"
    }
}

pub const FREE_PLAN: &str = "Free";

pub static PLANS: &[Plan] = &[
    Plan {
        name: FREE_PLAN,
        price: "Free",
        period: "forever",
        description: "Try the platform with a single live posting.",
        features: &[
            "1 active job posting",
            "10 CV database views",
            "Basic applicant tracking",
            "Email support",
        ],
        popular: false,
        limits: PlanLimits {
            max_jobs: Some(1),
            max_cv_views: Some(10),
            featured_jobs: 0,
        },
    },
    Plan {
        name: "Starter",
        price: "₹19,999",
        period: "per year",
        description: "For small teams hiring a few roles at a time.",
        features: &[
            "5 active job postings",
            "200 CV database views",
            "Applicant status pipeline",
            "Resume download",
            "Priority email support",
        ],
        popular: false,
        limits: PlanLimits {
            max_jobs: Some(5),
            max_cv_views: Some(200),
            featured_jobs: 1,
        },
    },
    Plan {
        name: "Professional",
        price: "₹39,999",
        period: "per year",
        description: "For growing companies with continuous hiring.",
        features: &[
            "20 active job postings",
            "1,000 CV database views",
            "5 featured job slots",
            "Applicant status pipeline",
            "Resume download",
            "Dedicated account manager",
        ],
        popular: true,
        limits: PlanLimits {
            max_jobs: Some(20),
            max_cv_views: Some(1000),
            featured_jobs: 5,
        },
    },
    Plan {
        name: "Enterprise",
        price: "Custom",
        period: "tailored",
        description: "Volume hiring with custom terms.",
        features: &[
            "Unlimited job postings",
            "Unlimited CV database access",
            "Unlimited featured jobs",
            "Custom integrations",
            "24/7 support",
        ],
        popular: false,
        limits: PlanLimits {
            max_jobs: None,
            max_cv_views: None,
            featured_jobs: u32::MAX,
        },
    },
];

/// Case-insensitive catalog lookup.
pub fn find_plan(name: &str) -> Option<&'static Plan> {
    let name = name.trim();
    PLANS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
