// Search request model and itinerary planning
// Requests arrive already shaped by the HTTP layer; validation here only guards the
// structural invariants the composition pipeline relies on.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_DESTINATIONS: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("At least one destination is required")]
    NoDestinations,

    #[error("Too many destinations: {0} (at most 5 are supported)")]
    TooManyDestinations(usize),

    #[error("Destination {0} appears more than once")]
    DuplicateDestination(String),

    #[error("Destination {0} is the trip origin")]
    DestinationIsOrigin(String),

    #[error("Invalid location code: {0:?}")]
    InvalidLocationCode(String),

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("{nights} night(s) cannot cover {destinations} destination(s)")]
    TooFewNights { nights: u32, destinations: usize },

    #[error("At least one adult traveler is required")]
    NoAdults,

    #[error("Budget must be a positive amount, got {0}")]
    InvalidBudget(f64),

    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelerCounts {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl TravelerCounts {
    pub fn new(adults: u32, children: u32, infants: u32) -> Self {
        Self {
            adults,
            children,
            infants,
        }
    }

    // Travelers occupying a seat or a bed; infants travel on a lap
    pub fn seated(&self) -> u32 {
        self.adults + self.children
    }

    pub fn total(&self) -> u32 {
        self.adults + self.children + self.infants
    }
}

impl Default for TravelerCounts {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

// Accommodation preference, also passed to hotel providers as a budget hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccommodationTier {
    Budget,
    MidRange,
    Luxury,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Relaxed,
    Moderate,
    Packed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub accommodation: Option<AccommodationTier>,
    pub interests: Vec<String>,
    pub pace: Option<Pace>,
}

impl Preferences {
    pub fn is_interested_in(&self, archetype: &str) -> bool {
        self.interests
            .iter()
            .any(|interest| interest.eq_ignore_ascii_case(archetype))
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub origin: String,
    pub destinations: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub travelers: TravelerCounts,
    #[serde(default)]
    pub cabin_class: CabinClass,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl SearchRequest {
    pub fn new(
        origin: &str,
        destinations: &[&str],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            origin: origin.to_string(),
            destinations: destinations.iter().map(|d| d.to_string()).collect(),
            start_date,
            end_date,
            travelers: TravelerCounts::default(),
            cabin_class: CabinClass::default(),
            currency: default_currency(),
            budget: None,
            preferences: Preferences::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.destinations.is_empty() {
            return Err(ValidationError::NoDestinations);
        }
        if self.destinations.len() > MAX_DESTINATIONS {
            return Err(ValidationError::TooManyDestinations(self.destinations.len()));
        }

        validate_location_code(&self.origin)?;
        for (index, destination) in self.destinations.iter().enumerate() {
            validate_location_code(destination)?;
            if destination == &self.origin {
                return Err(ValidationError::DestinationIsOrigin(destination.clone()));
            }
            if self.destinations[..index].contains(destination) {
                return Err(ValidationError::DuplicateDestination(destination.clone()));
            }
        }

        if self.end_date < self.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        // Every stop needs a night, or the return leg would land after end_date
        if (self.total_nights() as usize) < self.destinations.len() {
            return Err(ValidationError::TooFewNights {
                nights: self.total_nights(),
                destinations: self.destinations.len(),
            });
        }
        if self.travelers.adults == 0 {
            return Err(ValidationError::NoAdults);
        }
        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget <= 0.0 {
                return Err(ValidationError::InvalidBudget(budget));
            }
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }

        Ok(())
    }

    pub fn total_nights(&self) -> u32 {
        (self.end_date - self.start_date).num_days().max(0) as u32
    }
}

fn validate_location_code(code: &str) -> Result<(), ValidationError> {
    let valid = !code.is_empty()
        && code.len() <= 8
        && code.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidLocationCode(code.to_string()))
    }
}

// One stay at a destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub destination: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stop {
    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days().max(0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegKind {
    Outbound,
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightLeg {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    pub kind: LegKind,
}

impl FlightLeg {
    // Key under which the leg's offers are stored in the flight result set
    pub fn key(&self) -> String {
        leg_key(&self.from, &self.to)
    }
}

pub fn leg_key(from: &str, to: &str) -> String {
    format!("{}-{}", from, to)
}

/// Ordered plan of stays and flight legs derived from a [`SearchRequest`].
///
/// Nights are split evenly across destinations, earlier stops taking the
/// remainder. Validation guarantees a night per stop; `plan` still clamps each
/// stop to one night for unvalidated input. Outbound legs chain from
/// the origin through each destination; a single return leg flies home from the
/// last stop on its check-out date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub origin: String,
    pub stops: Vec<Stop>,
    pub outbound: Vec<FlightLeg>,
    pub return_leg: FlightLeg,
}

impl Itinerary {
    pub fn plan(request: &SearchRequest) -> Self {
        let stop_count = request.destinations.len().max(1) as u32;
        let total_nights = request.total_nights();
        let base = total_nights / stop_count;
        let remainder = total_nights % stop_count;

        let mut stops = Vec::with_capacity(request.destinations.len());
        let mut outbound = Vec::with_capacity(request.destinations.len());
        let mut check_in = request.start_date;
        let mut from = request.origin.clone();

        for (index, destination) in request.destinations.iter().enumerate() {
            let extra = u32::from((index as u32) < remainder);
            let nights = (base + extra).max(1);
            let check_out = check_in + Duration::days(i64::from(nights));

            outbound.push(FlightLeg {
                from: from.clone(),
                to: destination.clone(),
                date: check_in,
                kind: LegKind::Outbound,
            });
            stops.push(Stop {
                destination: destination.clone(),
                check_in,
                check_out,
            });

            from = destination.clone();
            check_in = check_out;
        }

        let return_leg = FlightLeg {
            from,
            to: request.origin.clone(),
            date: check_in,
            kind: LegKind::Return,
        };

        Self {
            origin: request.origin.clone(),
            stops,
            outbound,
            return_leg,
        }
    }

    // Outbound legs in order, then the return leg
    pub fn legs(&self) -> impl Iterator<Item = &FlightLeg> {
        self.outbound.iter().chain(std::iter::once(&self.return_leg))
    }

    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.stops.iter().map(|stop| stop.destination.as_str())
    }
}
