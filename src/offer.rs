// Normalized provider offers
// Every provider category (live or synthetic) is mapped into these structures before
// selection, so the tier rules never see supplier-specific payloads.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderCategory {
    Flights,
    Hotels,
    Activities,
    Weather,
}

impl ProviderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCategory::Flights => "flights",
            ProviderCategory::Hotels => "hotels",
            ProviderCategory::Activities => "activities",
            ProviderCategory::Weather => "weather",
        }
    }
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

impl Price {
    pub fn new(amount: f64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

// Whole-party fares per cabin, when the provider quotes more than one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CabinPrices {
    pub economy: f64,
    pub business: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetails {
    pub airline: String,
    pub flight_number: String,
    pub from: String,
    pub to: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub stops: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabin_prices: Option<CabinPrices>,
}

impl FlightDetails {
    pub fn duration_minutes(&self) -> i64 {
        (self.arrival - self.departure).num_minutes()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetails {
    pub name: String,
    pub star_rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_rating: Option<f32>,
    pub nightly_rate: f64,
    pub nights: u32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default)]
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetails {
    pub name: String,
    pub archetype: String,
    pub duration_hours: f32,
    pub rating: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum OfferDetails {
    Flight(FlightDetails),
    Hotel(HotelDetails),
    Activity(ActivityDetails),
}

/// A single priced offer from a provider or from the fallback generator.
///
/// `price` carries the category's pricing basis: the whole-party fare in the
/// requested cabin for flights, the full stay total for hotels and the per-adult
/// price for activities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOffer {
    pub id: String,
    pub provider: String,
    pub destination: String,
    pub price: Price,
    #[serde(default)]
    pub synthetic: bool,
    pub details: OfferDetails,
}

impl ProviderOffer {
    pub fn category(&self) -> ProviderCategory {
        match self.details {
            OfferDetails::Flight(_) => ProviderCategory::Flights,
            OfferDetails::Hotel(_) => ProviderCategory::Hotels,
            OfferDetails::Activity(_) => ProviderCategory::Activities,
        }
    }

    pub fn as_flight(&self) -> Option<&FlightDetails> {
        match &self.details {
            OfferDetails::Flight(details) => Some(details),
            _ => None,
        }
    }

    pub fn as_hotel(&self) -> Option<&HotelDetails> {
        match &self.details {
            OfferDetails::Hotel(details) => Some(details),
            _ => None,
        }
    }

    pub fn as_activity(&self) -> Option<&ActivityDetails> {
        match &self.details {
            OfferDetails::Activity(details) => Some(details),
            _ => None,
        }
    }

    pub fn business_fare(&self) -> Option<f64> {
        self.as_flight()
            .and_then(|flight| flight.cabin_prices)
            .map(|prices| prices.business)
    }

    // Hotels compare on the nightly rate; anything else falls back to the offer price
    pub fn nightly_rate(&self) -> f64 {
        self.as_hotel()
            .map_or(self.price.amount, |hotel| hotel.nightly_rate)
    }

    pub fn star_rating(&self) -> Option<u8> {
        self.as_hotel().map(|hotel| hotel.star_rating)
    }

    // Quality score on a 0-5 scale used for package ratings
    pub fn quality_rating(&self) -> Option<f32> {
        match &self.details {
            OfferDetails::Hotel(hotel) => Some(f32::from(hotel.star_rating)),
            OfferDetails::Activity(activity) => Some(activity.rating),
            OfferDetails::Flight(_) => None,
        }
    }

    pub fn display_name(&self) -> String {
        match &self.details {
            OfferDetails::Flight(flight) => format!("{} {}", flight.airline, flight.flight_number),
            OfferDetails::Hotel(hotel) => hotel.name.clone(),
            OfferDetails::Activity(activity) => activity.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rain,
    Thunderstorm,
    Snow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub condition: WeatherCondition,
    pub high_c: f32,
    pub low_c: f32,
    pub precipitation_chance: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub destination: String,
    pub days: Vec<DailyForecast>,
    #[serde(default)]
    pub synthetic: bool,
}

// Anything that can be a fallback stand-in for live provider data
pub trait Synthetic {
    fn is_synthetic(&self) -> bool;
}

impl Synthetic for ProviderOffer {
    fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

impl Synthetic for WeatherSummary {
    fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_offer_category_follows_details() {
        let flight = fixtures::flight("f1", "CDG", 100.0, 500.0);
        let hotel = fixtures::hotel("h1", "CDG", 4, 150.0);
        let activity = fixtures::activity("a1", "CDG", 25.0);

        assert_eq!(flight.category(), ProviderCategory::Flights);
        assert_eq!(hotel.category(), ProviderCategory::Hotels);
        assert_eq!(activity.category(), ProviderCategory::Activities);
        assert_eq!(flight.business_fare(), Some(500.0));
        assert_eq!(hotel.star_rating(), Some(4));
        assert_eq!(activity.star_rating(), None);
    }

    #[test]
    fn test_details_serialize_with_category_tag() {
        let hotel = fixtures::hotel("h1", "CDG", 3, 300.0);
        let json = serde_json::to_value(&hotel).unwrap();

        assert_eq!(json["details"]["category"], "hotel");
        assert_eq!(json["details"]["starRating"], 3);
        assert_eq!(json["synthetic"], false);

        let back: ProviderOffer = serde_json::from_value(json).unwrap();
        assert_eq!(back, hotel);
    }
}
