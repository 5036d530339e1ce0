//! Per-type rendering and selection of suggestions
//!
//! Destinations and tours navigate to their detail page when picked;
//! provinces fill the bound input. Rendering produces plain display fields,
//! with emphasis markup only inside `title`.

use crate::api::{Destination, Price, Tour};
use crate::nav::Navigation;
use crate::text::highlight;

/// Stars shown for a destination rating
const MAX_STARS: usize = 5;

/// One suggestion of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    Destination(Destination),
    Tour(Tour),
    Province(String),
}

/// What picking a suggestion does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Leave the page
    Navigate(Navigation),
    /// Copy text into the bound input
    Fill(String),
}

/// Display fields for one panel row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedItem {
    /// Name, possibly with `<strong>` around the matched fragment
    pub title: String,
    pub subtitle: Option<String>,
    pub badge: Option<String>,
    pub rating: Option<String>,
}

impl Suggestion {
    /// Literal display name
    pub fn name(&self) -> &str {
        match self {
            Self::Destination(d) => &d.name,
            Self::Tour(t) => &t.name,
            Self::Province(p) => p,
        }
    }

    pub fn render(&self, query: &str) -> RenderedItem {
        match self {
            Self::Destination(d) => RenderedItem {
                title: highlight(&d.name, query),
                subtitle: Some(format!("{} · {}", d.location, d.travel_type)),
                badge: Some(format!("{} pts", format_score(d.score))),
                rating: Some(stars(d.avg_rating)),
            },
            Self::Tour(t) => RenderedItem {
                title: highlight(&t.name, query),
                subtitle: t.price.as_ref().map(format_price),
                badge: None,
                rating: None,
            },
            // Province names are shown verbatim
            Self::Province(p) => RenderedItem {
                title: p.clone(),
                ..RenderedItem::default()
            },
        }
    }

    pub fn select(&self) -> Selection {
        match self {
            Self::Destination(d) => Selection::Navigate(Navigation::Destination { id: d.id }),
            Self::Tour(t) => Selection::Navigate(Navigation::Tour {
                slug: t.slug.clone(),
            }),
            Self::Province(p) => Selection::Fill(p.clone()),
        }
    }
}

/// Score badge value; a missing score shows as 0
pub fn format_score(score: Option<f64>) -> String {
    let score = score.unwrap_or(0.0);
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.1}", score)
    }
}

/// Filled and empty stars for the rounded rating, clamped to 0..=5
pub fn stars(avg_rating: Option<f64>) -> String {
    let filled = avg_rating
        .unwrap_or(0.0)
        .round()
        .clamp(0.0, MAX_STARS as f64) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(MAX_STARS - filled))
}

/// Price in dong with `.` thousands separators, e.g. `1.500.000 ₫`
pub fn format_price(price: &Price) -> String {
    let amount = match price {
        Price::Amount(amount) => *amount,
        Price::Text(text) => match text.trim().parse::<f64>() {
            Ok(amount) => amount,
            Err(_) => return text.clone(),
        },
    };

    let whole = amount.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{} ₫", grouped)
}
