// Package assembly and pricing

use crate::offer::ProviderOffer;
use crate::search::SearchRequest;
use crate::tier_selector::{FareBasis, SelectedFlight, StopSelection, Tier, TierSelection, TierSelections};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Per-category subtotals, rounded to cents for display
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub flights: f64,
    pub hotels: f64,
    pub activities: f64,
}

impl PriceBreakdown {
    fn rounded(self) -> Self {
        Self {
            flights: round2(self.flights),
            hotels: round2(self.hotels),
            activities: round2(self.activities),
        }
    }

    // Whole currency units, computed from the unrounded subtotals
    fn total(&self) -> f64 {
        (self.flights + self.hotels + self.activities).round()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPackage {
    pub tier: Tier,
    pub name: String,
    pub description: String,
    pub stops: Vec<StopSelection>,
    pub return_flight: SelectedFlight,
    pub breakdown: PriceBreakdown,
    pub total_price: f64,
    pub currency: String,
    pub savings: f64,
    pub rating: f32,
    pub highlights: Vec<String>,
    pub synthetic: bool,
}

impl TripPackage {
    pub fn offer_ids(&self) -> Vec<&str> {
        self.stops
            .iter()
            .flat_map(|stop| {
                std::iter::once(stop.flight.offer.id.as_str())
                    .chain(std::iter::once(stop.hotel.id.as_str()))
                    .chain(stop.activities.iter().map(|activity| activity.id.as_str()))
            })
            .chain(std::iter::once(self.return_flight.offer.id.as_str()))
            .collect()
    }
}

/// Turns per-tier selections into priced packages.
///
/// Totals are whole currency units; savings are measured against the luxury
/// package, and packages above the budget ceiling are dropped.
#[derive(Debug, Clone)]
pub struct PackageComposer {
    adults: u32,
    currency: String,
    budget: Option<f64>,
}

impl PackageComposer {
    pub fn new(adults: u32, currency: &str) -> Self {
        Self {
            adults,
            currency: currency.to_string(),
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: Option<f64>) -> Self {
        self.budget = budget;
        self
    }

    pub fn from_request(request: &SearchRequest) -> Self {
        Self::new(request.travelers.adults, &request.currency).with_budget(request.budget)
    }

    // Unrounded subtotals for a selection
    pub fn price(&self, selection: &TierSelection) -> PriceBreakdown {
        for offer in selection.offers() {
            if offer.price.currency != self.currency {
                warn!(
                    offer_id = %offer.id,
                    offer_currency = %offer.price.currency,
                    package_currency = %self.currency,
                    "offer priced in a different currency; amounts are summed without conversion"
                );
            }
        }

        let flights: f64 = selection
            .stops
            .iter()
            .map(|stop| stop.flight.fare())
            .chain(std::iter::once(selection.return_flight.fare()))
            .sum();
        let hotels: f64 = selection.stops.iter().map(|stop| stop.hotel.price.amount).sum();
        let per_adult: f64 = selection
            .stops
            .iter()
            .flat_map(|stop| stop.activities.iter())
            .map(|activity| activity.price.amount)
            .sum();

        PriceBreakdown {
            flights,
            hotels,
            activities: per_adult * f64::from(self.adults),
        }
    }

    pub fn compose(&self, selections: TierSelections) -> Vec<TripPackage> {
        let TierSelections {
            budget,
            standard,
            luxury,
        } = selections;

        let mut packages: Vec<TripPackage> = [budget, standard, luxury]
            .into_iter()
            .map(|selection| self.build(selection))
            .collect();

        let luxury_total = packages
            .iter()
            .find(|package| package.tier == Tier::Luxury)
            .map_or(0.0, |package| package.total_price);
        for package in &mut packages {
            package.savings = luxury_total - package.total_price;
        }

        if let Some(ceiling) = self.budget {
            packages.retain(|package| {
                let within = package.total_price <= ceiling;
                if !within {
                    debug!(
                        tier = ?package.tier,
                        total = package.total_price,
                        ceiling,
                        "package exceeds budget ceiling"
                    );
                }
                within
            });
        }

        packages
    }

    fn build(&self, selection: TierSelection) -> TripPackage {
        let raw = self.price(&selection);
        let total_price = raw.total();
        let rating = package_rating(&selection);
        let synthetic = selection.offers().any(|offer| offer.synthetic);
        let highlights = highlights(&selection, synthetic);
        let TierSelection {
            tier,
            stops,
            return_flight,
        } = selection;

        TripPackage {
            tier,
            name: tier.name().to_string(),
            description: tier.description().to_string(),
            stops,
            return_flight,
            breakdown: raw.rounded(),
            total_price,
            currency: self.currency.clone(),
            savings: 0.0,
            rating,
            highlights,
            synthetic,
        }
    }
}

// Mean of hotel stars and activity ratings, one decimal
fn package_rating(selection: &TierSelection) -> f32 {
    let ratings: Vec<f32> = selection
        .stops
        .iter()
        .flat_map(|stop| std::iter::once(&stop.hotel).chain(stop.activities.iter()))
        .filter_map(ProviderOffer::quality_rating)
        .collect();

    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().sum::<f32>() / ratings.len() as f32;
    (mean * 10.0).round() / 10.0
}

fn highlights(selection: &TierSelection, synthetic: bool) -> Vec<String> {
    let mut highlights = Vec::new();

    let flights: Vec<&SelectedFlight> = selection
        .stops
        .iter()
        .map(|stop| &stop.flight)
        .chain(std::iter::once(&selection.return_flight))
        .collect();
    let nonstop = flights
        .iter()
        .all(|flight| flight.offer.as_flight().is_some_and(|details| details.stops == 0));
    if nonstop {
        highlights.push("Non-stop flights on every leg".to_string());
    }
    if flights
        .iter()
        .any(|flight| flight.fare_basis == FareBasis::Business)
    {
        highlights.push("Business-class fares".to_string());
    }

    for stop in &selection.stops {
        if let Some(hotel) = stop.hotel.as_hotel() {
            highlights.push(format!(
                "{} night{} at {} ({}-star) in {}",
                hotel.nights,
                if hotel.nights == 1 { "" } else { "s" },
                hotel.name,
                hotel.star_rating,
                stop.destination
            ));
        }
    }

    let activity_count: usize = selection.stops.iter().map(|stop| stop.activities.len()).sum();
    if activity_count > 0 {
        highlights.push(format!("{} curated activities", activity_count));
    }

    if synthetic {
        highlights.push("Includes estimated prices for unavailable providers".to_string());
    }

    highlights
}
