// Synthetic stand-in offers for failed provider calls
// Each call seeds its own generator from the base seed and the call's identity, so the same
// (category, destination, date, travelers) always produces the same offers.

use crate::offer::{
    ActivityDetails, CabinPrices, DailyForecast, FlightDetails, HotelDetails, OfferDetails, Price,
    ProviderCategory, ProviderOffer, WeatherCondition, WeatherSummary,
};
use crate::search::{CabinClass, FlightLeg, Preferences, Stop, TravelerCounts};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const FALLBACK_PROVIDER: &str = "fallback";

const AIRLINES: [(&str, &str); 6] = [
    ("SL", "SkyLine Air"),
    ("AT", "Atlas Airways"),
    ("MR", "Meridian"),
    ("BJ", "BlueJet"),
    ("PA", "Polar Air"),
    ("CW", "Crosswind"),
];

const HOTEL_PREFIXES: [&str; 8] = [
    "Grand", "Central", "Harbor", "Old Town", "Park", "Royal", "City", "Garden",
];
const HOTEL_SUFFIXES: [&str; 5] = ["Hotel", "Inn", "Suites", "Lodge", "Residence"];
const AMENITIES: [&str; 6] = ["wifi", "breakfast", "gym", "pool", "spa", "concierge"];

struct ActivityArchetype {
    archetype: &'static str,
    name: &'static str,
    min_price: f64,
    max_price: f64,
    duration_hours: f32,
}

const ARCHETYPES: [ActivityArchetype; 8] = [
    ActivityArchetype {
        archetype: "culture",
        name: "Guided Walking Tour",
        min_price: 15.0,
        max_price: 45.0,
        duration_hours: 3.0,
    },
    ActivityArchetype {
        archetype: "history",
        name: "Museum Pass",
        min_price: 20.0,
        max_price: 65.0,
        duration_hours: 4.0,
    },
    ActivityArchetype {
        archetype: "food",
        name: "Street Food Tasting",
        min_price: 30.0,
        max_price: 90.0,
        duration_hours: 3.0,
    },
    ActivityArchetype {
        archetype: "sightseeing",
        name: "Harbor Cruise",
        min_price: 25.0,
        max_price: 95.0,
        duration_hours: 2.0,
    },
    ActivityArchetype {
        archetype: "nature",
        name: "Countryside Day Trip",
        min_price: 70.0,
        max_price: 180.0,
        duration_hours: 8.0,
    },
    ActivityArchetype {
        archetype: "adventure",
        name: "Outdoor Adventure",
        min_price: 50.0,
        max_price: 160.0,
        duration_hours: 5.0,
    },
    ActivityArchetype {
        archetype: "wellness",
        name: "Spa Afternoon",
        min_price: 60.0,
        max_price: 200.0,
        duration_hours: 3.0,
    },
    ActivityArchetype {
        archetype: "nightlife",
        name: "Live Music Evening",
        min_price: 20.0,
        max_price: 70.0,
        duration_hours: 4.0,
    },
];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

// FNV-1a over the call identity, starting from the configured base seed
fn mix_seed(base_seed: u64, parts: &[&str]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET ^ base_seed;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(0xff)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

fn travelers_key(travelers: &TravelerCounts) -> String {
    format!("{}-{}-{}", travelers.adults, travelers.children, travelers.infants)
}

#[derive(Debug, Clone, Copy)]
pub struct FallbackGenerator {
    base_seed: u64,
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new(0x5eed)
    }
}

impl FallbackGenerator {
    pub const FLIGHT_COUNT: usize = 5;
    pub const HOTEL_COUNT: usize = 10;
    pub const ACTIVITY_COUNT: usize = ARCHETYPES.len();

    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    fn rng_for(&self, category: ProviderCategory, key: &str, date: NaiveDate, extra: &str) -> StdRng {
        let date = date.to_string();
        let seed = mix_seed(self.base_seed, &[category.as_str(), key, &date, extra]);
        StdRng::seed_from_u64(seed)
    }

    /// Five flights for `leg`, priced for the whole party.
    ///
    /// `price` is quoted in the requested cabin; economy and business fares are
    /// always exposed through `cabin_prices`.
    pub fn flights(
        &self,
        leg: &FlightLeg,
        travelers: &TravelerCounts,
        cabin: CabinClass,
        currency: &str,
    ) -> Vec<ProviderOffer> {
        let mut rng = self.rng_for(
            ProviderCategory::Flights,
            &leg.key(),
            leg.date,
            &format!("{}|{}", travelers_key(travelers), cabin.as_str()),
        );
        // Infants pay a tenth of a seat
        let party = f64::from(travelers.seated().max(1)) + 0.1 * f64::from(travelers.infants);

        (0..Self::FLIGHT_COUNT)
            .map(|index| {
                let (code, airline) = AIRLINES[rng.gen_range(0..AIRLINES.len())];
                let departure_hour = rng.gen_range(6..=21);
                let departure_minute = [0, 15, 30, 45][rng.gen_range(0..4)];
                let duration = Duration::minutes(rng.gen_range(60..=720));
                let stops = if duration > Duration::hours(8) {
                    rng.gen_range(0..=1)
                } else {
                    0
                };

                let economy_seat: f64 = rng.gen_range(120.0..650.0);
                let business_seat = economy_seat * rng.gen_range(2.5..4.0);
                let economy = round2(economy_seat * party);
                let business = round2(business_seat * party);
                let quoted = match cabin {
                    CabinClass::Economy => economy,
                    CabinClass::PremiumEconomy => round2(economy * 1.6),
                    CabinClass::Business => business,
                    CabinClass::First => round2(business * 1.5),
                };

                let departure = leg
                    .date
                    .and_hms_opt(departure_hour, departure_minute, 0)
                    .unwrap_or_default();

                ProviderOffer {
                    id: format!("synthetic-flight-{}-{}", leg.key(), index + 1),
                    provider: FALLBACK_PROVIDER.to_string(),
                    destination: leg.to.clone(),
                    price: Price::new(quoted, currency),
                    synthetic: true,
                    details: OfferDetails::Flight(FlightDetails {
                        airline: airline.to_string(),
                        flight_number: format!("{}{}", code, rng.gen_range(100..=9999)),
                        from: leg.from.clone(),
                        to: leg.to.clone(),
                        departure,
                        arrival: departure + duration,
                        stops,
                        cabin_prices: Some(CabinPrices { economy, business }),
                    }),
                }
            })
            .collect()
    }

    // Ten hotels for the stay; price is the stay total for the party
    pub fn hotels(&self, stop: &Stop, travelers: &TravelerCounts, currency: &str) -> Vec<ProviderOffer> {
        let mut rng = self.rng_for(
            ProviderCategory::Hotels,
            &stop.destination,
            stop.check_in,
            &travelers_key(travelers),
        );
        let nights = stop.nights().max(1);
        let check_out = stop.check_in + Duration::days(i64::from(nights));
        let rooms = travelers.seated().max(1).div_ceil(2);

        (0..Self::HOTEL_COUNT)
            .map(|index| {
                let stars: u8 = rng.gen_range(1..=5);
                let room_rate = (35.0 + 40.0 * f64::from(stars)) * rng.gen_range(0.8..1.3);
                let nightly_rate = round2(room_rate * f64::from(rooms));
                let name = format!(
                    "{} {} {}",
                    HOTEL_PREFIXES[rng.gen_range(0..HOTEL_PREFIXES.len())],
                    stop.destination,
                    HOTEL_SUFFIXES[rng.gen_range(0..HOTEL_SUFFIXES.len())]
                );
                let amenity_count = (usize::from(stars) + 1).min(AMENITIES.len());

                ProviderOffer {
                    id: format!("synthetic-hotel-{}-{}", stop.destination, index + 1),
                    provider: FALLBACK_PROVIDER.to_string(),
                    destination: stop.destination.clone(),
                    price: Price::new(round2(nightly_rate * f64::from(nights)), currency),
                    synthetic: true,
                    details: OfferDetails::Hotel(HotelDetails {
                        name,
                        star_rating: stars,
                        guest_rating: Some(round1(rng.gen_range(6.0..9.8))),
                        nightly_rate,
                        nights,
                        check_in: stop.check_in,
                        check_out,
                        amenities: AMENITIES[..amenity_count]
                            .iter()
                            .map(|amenity| amenity.to_string())
                            .collect(),
                    }),
                }
            })
            .collect()
    }

    // One activity per archetype, archetypes matching the traveler's interests first
    pub fn activities(
        &self,
        destination: &str,
        date: NaiveDate,
        travelers: &TravelerCounts,
        preferences: &Preferences,
        currency: &str,
    ) -> Vec<ProviderOffer> {
        let mut rng = self.rng_for(
            ProviderCategory::Activities,
            destination,
            date,
            &travelers_key(travelers),
        );

        let mut archetypes: Vec<&ActivityArchetype> = ARCHETYPES.iter().collect();
        archetypes.sort_by_key(|archetype| !preferences.is_interested_in(archetype.archetype));

        archetypes
            .into_iter()
            .map(|archetype| ProviderOffer {
                id: format!("synthetic-activity-{}-{}", destination, archetype.archetype),
                provider: FALLBACK_PROVIDER.to_string(),
                destination: destination.to_string(),
                price: Price::new(
                    round2(rng.gen_range(archetype.min_price..archetype.max_price)),
                    currency,
                ),
                synthetic: true,
                details: OfferDetails::Activity(ActivityDetails {
                    name: format!("{} in {}", archetype.name, destination),
                    archetype: archetype.archetype.to_string(),
                    duration_hours: archetype.duration_hours,
                    rating: round1(rng.gen_range(3.8..5.0)),
                }),
            })
            .collect()
    }

    // One forecast day per calendar day from `start` to `end` inclusive
    pub fn weather(&self, destination: &str, start: NaiveDate, end: NaiveDate) -> WeatherSummary {
        let mut rng = self.rng_for(ProviderCategory::Weather, destination, start, &end.to_string());
        let conditions = [
            WeatherCondition::Sunny,
            WeatherCondition::PartlyCloudy,
            WeatherCondition::Cloudy,
            WeatherCondition::Rain,
            WeatherCondition::Thunderstorm,
        ];

        let days = start
            .iter_days()
            .take_while(|day| *day <= end.max(start))
            .map(|date| {
                let condition = conditions[rng.gen_range(0..conditions.len())];
                let high_c: f32 = rng.gen_range(12.0..32.0);
                let low_c = high_c - rng.gen_range(4.0..10.0);
                let precipitation_chance = match condition {
                    WeatherCondition::Sunny => rng.gen_range(0..10),
                    WeatherCondition::PartlyCloudy => rng.gen_range(5..30),
                    WeatherCondition::Cloudy => rng.gen_range(20..50),
                    _ => rng.gen_range(60..=100),
                };
                DailyForecast {
                    date,
                    condition,
                    high_c: round1(high_c),
                    low_c: round1(low_c),
                    precipitation_chance,
                }
            })
            .collect();

        WeatherSummary {
            destination: destination.to_string(),
            days,
            synthetic: true,
        }
    }
}
