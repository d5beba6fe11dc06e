// Per-tier selection of flights, hotels and activities
// The rule table below defines the product's pricing tiers and is reproduced as-is, including
// the mixed price bases of the flight rules (budget compares quoted fares, luxury business fares).

use crate::offer::ProviderOffer;
use crate::result_set::RawResults;
use crate::search::Itinerary;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    #[error("No flight offers available for leg {leg}")]
    NoFlights { leg: String },

    #[error("No hotel offers available for destination {destination}")]
    NoHotels { destination: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Budget,
    Standard,
    Luxury,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Budget, Tier::Standard, Tier::Luxury];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Budget => "Budget Explorer",
            Tier::Standard => "Classic Getaway",
            Tier::Luxury => "Luxury Escape",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tier::Budget => "The lowest fares, stays and activities we could find for your dates.",
            Tier::Standard => "Comfortable mid-range hotels with a balanced activity plan.",
            Tier::Luxury => "Premium cabins, top-rated hotels and a full activity program.",
        }
    }

    // Maximum number of activities per destination
    pub fn activity_limit(&self) -> usize {
        match self {
            Tier::Budget => 2,
            Tier::Standard => 3,
            Tier::Luxury => 5,
        }
    }
}

// Which fare of a flight offer the package pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FareBasis {
    Quoted,
    Business,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFlight {
    pub offer: ProviderOffer,
    pub fare_basis: FareBasis,
}

impl SelectedFlight {
    pub fn fare(&self) -> f64 {
        match self.fare_basis {
            FareBasis::Quoted => self.offer.price.amount,
            FareBasis::Business => self.offer.business_fare().unwrap_or(self.offer.price.amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSelection {
    pub destination: String,
    // Leg arriving at this destination
    pub flight: SelectedFlight,
    pub hotel: ProviderOffer,
    pub activities: Vec<ProviderOffer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierSelection {
    pub tier: Tier,
    pub stops: Vec<StopSelection>,
    pub return_flight: SelectedFlight,
}

impl TierSelection {
    // Every offer the selection pays for, flights first
    pub fn offers(&self) -> impl Iterator<Item = &ProviderOffer> {
        self.stops
            .iter()
            .map(|stop| &stop.flight.offer)
            .chain(std::iter::once(&self.return_flight.offer))
            .chain(self.stops.iter().map(|stop| &stop.hotel))
            .chain(self.stops.iter().flat_map(|stop| stop.activities.iter()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierSelections {
    pub budget: TierSelection,
    pub standard: TierSelection,
    pub luxury: TierSelection,
}

pub struct TierSelector<'a> {
    itinerary: &'a Itinerary,
}

impl<'a> TierSelector<'a> {
    pub fn new(itinerary: &'a Itinerary) -> Self {
        Self { itinerary }
    }

    /// Picks one flight per leg, one hotel and a bounded activity list per
    /// destination for `tier`.
    ///
    /// Fails when any leg has no flight offers or any destination has no hotel
    /// offers; a destination without activities simply gets none.
    pub fn select(&self, tier: Tier, results: &RawResults) -> Result<TierSelection, CompositionError> {
        let mut stops = Vec::with_capacity(self.itinerary.stops.len());

        for (leg, stop) in self.itinerary.outbound.iter().zip(&self.itinerary.stops) {
            let flight = Self::flight_for(tier, results, &leg.key())?;

            let hotels = results
                .hotels
                .get(&stop.destination)
                .filter(|offers| !offers.is_empty())
                .ok_or_else(|| CompositionError::NoHotels {
                    destination: stop.destination.clone(),
                })?;
            let activities = results.activities.get(&stop.destination).unwrap_or(&[]);

            stops.push(StopSelection {
                destination: stop.destination.clone(),
                flight,
                hotel: pick_hotel(tier, hotels).clone(),
                activities: pick_activities(tier, activities),
            });
        }

        let return_flight = Self::flight_for(tier, results, &self.itinerary.return_leg.key())?;

        Ok(TierSelection {
            tier,
            stops,
            return_flight,
        })
    }

    pub fn select_all(&self, results: &RawResults) -> Result<TierSelections, CompositionError> {
        Ok(TierSelections {
            budget: self.select(Tier::Budget, results)?,
            standard: self.select(Tier::Standard, results)?,
            luxury: self.select(Tier::Luxury, results)?,
        })
    }

    fn flight_for(tier: Tier, results: &RawResults, leg: &str) -> Result<SelectedFlight, CompositionError> {
        results
            .flights
            .get(leg)
            .and_then(|offers| pick_flight(tier, offers))
            .ok_or_else(|| CompositionError::NoFlights {
                leg: leg.to_string(),
            })
    }
}

// First offer with the smallest key; min_by would also keep the first, max_by keeps the last
fn first_extreme<'o, F>(offers: &'o [ProviderOffer], key: F, wanted: Ordering) -> Option<&'o ProviderOffer>
where
    F: Fn(&ProviderOffer) -> f64,
{
    offers.iter().reduce(|best, offer| {
        if key(offer).total_cmp(&key(best)) == wanted {
            offer
        } else {
            best
        }
    })
}

pub fn pick_flight(tier: Tier, offers: &[ProviderOffer]) -> Option<SelectedFlight> {
    if offers.is_empty() {
        return None;
    }

    let (offer, fare_basis) = match tier {
        Tier::Budget => (
            first_extreme(offers, |offer| offer.price.amount, Ordering::Less)?,
            FareBasis::Quoted,
        ),
        // Positional middle of the provider order, not the median price
        Tier::Standard => (&offers[offers.len() / 2], FareBasis::Quoted),
        Tier::Luxury => {
            let offer = first_extreme(
                offers,
                |offer| offer.business_fare().unwrap_or(offer.price.amount),
                Ordering::Greater,
            )?;
            let basis = if offer.business_fare().is_some() {
                FareBasis::Business
            } else {
                FareBasis::Quoted
            };
            (offer, basis)
        }
    };

    Some(SelectedFlight {
        offer: offer.clone(),
        fare_basis,
    })
}

// `offers` must be non-empty
pub fn pick_hotel(tier: Tier, offers: &[ProviderOffer]) -> &ProviderOffer {
    let chosen = match tier {
        Tier::Budget => first_extreme(offers, ProviderOffer::nightly_rate, Ordering::Less),
        Tier::Standard => offers
            .iter()
            .find(|offer| matches!(offer.star_rating(), Some(3..=4))),
        Tier::Luxury => offers
            .iter()
            .find(|offer| offer.star_rating().is_some_and(|stars| stars >= 4)),
    };
    chosen.unwrap_or(&offers[0])
}

pub fn pick_activities(tier: Tier, offers: &[ProviderOffer]) -> Vec<ProviderOffer> {
    let limit = tier.activity_limit();
    match tier {
        Tier::Budget => {
            let mut by_price: Vec<&ProviderOffer> = offers.iter().collect();
            by_price.sort_by(|a, b| a.price.amount.total_cmp(&b.price.amount));
            by_price.into_iter().take(limit).cloned().collect()
        }
        Tier::Standard | Tier::Luxury => offers.iter().take(limit).cloned().collect(),
    }
}
