// Hand-built offers and result sets shared by the unit tests

use crate::offer::{
    ActivityDetails, CabinPrices, FlightDetails, HotelDetails, OfferDetails, Price, ProviderOffer,
};
use crate::result_set::RawResults;
use crate::search::SearchRequest;
use chrono::{NaiveDate, NaiveDateTime};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).unwrap()
}

// Flight to `destination` quoted at `economy`, with a business fare alongside
pub fn flight(id: &str, destination: &str, economy: f64, business: f64) -> ProviderOffer {
    let day = date(2025, 6, 1);
    ProviderOffer {
        id: id.to_string(),
        provider: "test-air".to_string(),
        destination: destination.to_string(),
        price: Price::new(economy, "USD"),
        synthetic: false,
        details: OfferDetails::Flight(FlightDetails {
            airline: "Test Air".to_string(),
            flight_number: format!("TA{}", id.len() * 100),
            from: "JFK".to_string(),
            to: destination.to_string(),
            departure: at(day, 8),
            arrival: at(day, 16),
            stops: 0,
            cabin_prices: Some(CabinPrices { economy, business }),
        }),
    }
}

// Three-night stay priced at `stay_total`
pub fn hotel(id: &str, destination: &str, stars: u8, stay_total: f64) -> ProviderOffer {
    ProviderOffer {
        id: id.to_string(),
        provider: "test-hotels".to_string(),
        destination: destination.to_string(),
        price: Price::new(stay_total, "USD"),
        synthetic: false,
        details: OfferDetails::Hotel(HotelDetails {
            name: format!("Hotel {}", id),
            star_rating: stars,
            guest_rating: Some(8.0),
            nightly_rate: stay_total / 3.0,
            nights: 3,
            check_in: date(2025, 6, 1),
            check_out: date(2025, 6, 4),
            amenities: vec!["wifi".to_string()],
        }),
    }
}

pub fn activity(id: &str, destination: &str, per_adult: f64) -> ProviderOffer {
    ProviderOffer {
        id: id.to_string(),
        provider: "test-tours".to_string(),
        destination: destination.to_string(),
        price: Price::new(per_adult, "USD"),
        synthetic: false,
        details: OfferDetails::Activity(ActivityDetails {
            name: format!("Activity {}", id),
            archetype: "culture".to_string(),
            duration_hours: 2.0,
            rating: 4.5,
        }),
    }
}

// JFK -> CDG, three nights, one adult
pub fn single_destination_request() -> SearchRequest {
    SearchRequest::new("JFK", &["CDG"], date(2025, 6, 1), date(2025, 6, 4))
}

/// Reference result set for the single-destination request.
///
/// Outbound JFK-CDG: economy [100, 200, 300] / business [500, 800, 1100].
/// Return CDG-JFK: economy [90, 120, 150] / business [400, 650, 900].
/// Hotels: stars [2, 3, 5], stay totals [150, 300, 900].
/// Activities: [10, 20, 30, 40, 50] per adult.
pub fn reference_results() -> RawResults {
    let mut results = RawResults::default();
    results.flights.add(
        "JFK-CDG",
        vec![
            flight("out-1", "CDG", 100.0, 500.0),
            flight("out-2", "CDG", 200.0, 800.0),
            flight("out-3", "CDG", 300.0, 1100.0),
        ],
    );
    results.flights.add(
        "CDG-JFK",
        vec![
            flight("ret-1", "JFK", 90.0, 400.0),
            flight("ret-2", "JFK", 120.0, 650.0),
            flight("ret-3", "JFK", 150.0, 900.0),
        ],
    );
    results.hotels.add(
        "CDG",
        vec![
            hotel("hotel-2star", "CDG", 2, 150.0),
            hotel("hotel-3star", "CDG", 3, 300.0),
            hotel("hotel-5star", "CDG", 5, 900.0),
        ],
    );
    results.activities.add(
        "CDG",
        (1..=5)
            .map(|i| activity(&format!("act-{}", i), "CDG", f64::from(i * 10)))
            .collect(),
    );
    results
}
