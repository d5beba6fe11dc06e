// Composition service: provider fan-out, fallback substitution and package assembly

use crate::composer::{PackageComposer, TripPackage};
use crate::config::ServiceConfig;
use crate::fallback::FallbackGenerator;
use crate::offer::{ProviderCategory, ProviderOffer, WeatherSummary};
use crate::offer_cache::{create_cache_key, OfferCache};
use crate::provider::{ProviderError, Providers};
use crate::result_set::RawResults;
use crate::search::{
    AccommodationTier, FlightLeg, Itinerary, Pace, SearchRequest, Stop, TravelerCounts,
    ValidationError,
};
use crate::tier_selector::{CompositionError, TierSelector};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("Composition failed: {0}")]
    Composition(#[from] CompositionError),

    #[error("Composition timed out after {0}ms")]
    RequestTimeout(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionResponse {
    pub packages: Vec<TripPackage>,
    pub raw_results: RawResults,
}

pub struct TripPackageService {
    providers: Providers,
    fallback: FallbackGenerator,
    config: ServiceConfig,
    cache: Option<Arc<OfferCache>>,
}

impl TripPackageService {
    /// The offer cache is built from `config.cache` unless it is disabled there.
    pub fn new(providers: Providers, config: ServiceConfig) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(OfferCache::new(config.cache.clone())));
        Self {
            providers,
            fallback: FallbackGenerator::new(config.fallback_seed),
            config,
            cache,
        }
    }

    // Shares one cache between services; replaces the one built from config
    pub fn with_cache(mut self, cache: Arc<OfferCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&Arc<OfferCache>> {
        self.cache.as_ref()
    }

    /// Builds the budget, standard and luxury packages for `request`.
    ///
    /// Provider failures never fail the request: each failed or timed-out query is
    /// answered once from the fallback generator. Errors are limited to invalid
    /// requests, empty live results for a required leg or stay, and the overall
    /// request timeout. An empty package list means nothing fit the budget.
    #[instrument(
        skip(self, request),
        fields(origin = %request.origin, destinations = request.destinations.len())
    )]
    pub async fn compose(&self, request: &SearchRequest) -> Result<CompositionResponse, ServiceError> {
        request.validate()?;
        let itinerary = Itinerary::plan(request);

        let limit = self.config.request_timeout_ms;
        let raw_results = timeout(Duration::from_millis(limit), self.gather(request, &itinerary))
            .await
            .map_err(|_| {
                warn!(timeout_ms = limit, "composition exceeded request timeout");
                ServiceError::RequestTimeout(limit)
            })?;

        let selections = TierSelector::new(&itinerary).select_all(&raw_results)?;
        let packages = PackageComposer::from_request(request).compose(selections);

        info!(
            packages = packages.len(),
            fallbacks = raw_results.fallback_count(),
            "composed trip packages"
        );
        Ok(CompositionResponse {
            packages,
            raw_results,
        })
    }

    // All queries run concurrently; each fills its own (category, key) slot
    async fn gather(&self, request: &SearchRequest, itinerary: &Itinerary) -> RawResults {
        let flight_queries = itinerary.legs().map(|leg| self.flights_for(leg, request));
        let hotel_queries = itinerary.stops.iter().map(|stop| self.hotels_for(stop, request));
        let activity_queries = itinerary
            .stops
            .iter()
            .map(|stop| self.activities_for(stop, request));
        let weather_queries = itinerary.stops.iter().map(|stop| self.weather_for(stop));

        let (flights, hotels, activities, weather) = futures::join!(
            join_all(flight_queries),
            join_all(hotel_queries),
            join_all(activity_queries),
            join_all(weather_queries),
        );

        let mut results = RawResults::default();
        for (key, offers) in flights {
            results.flights.add(key, offers);
        }
        for (key, offers) in hotels {
            results.hotels.add(key, offers);
        }
        for (key, offers) in activities {
            results.activities.add(key, offers);
        }
        for (key, summary) in weather {
            results.weather.add(key, vec![summary]);
        }
        results
    }

    async fn flights_for(&self, leg: &FlightLeg, request: &SearchRequest) -> (String, Vec<ProviderOffer>) {
        let date = leg.date.to_string();
        let occupancy = occupancy_key(&request.travelers);
        let cache_key = create_cache_key(
            ProviderCategory::Flights,
            &leg.to,
            &[&leg.from, &date, request.cabin_class.as_str(), &occupancy],
        );

        let call = self.providers.flights.search(
            &leg.from,
            &leg.to,
            leg.date,
            &request.travelers,
            request.cabin_class,
        );
        let offers = self
            .query_offers(ProviderCategory::Flights, &leg.key(), cache_key, call, || {
                self.fallback
                    .flights(leg, &request.travelers, request.cabin_class, &request.currency)
            })
            .await;
        (leg.key(), offers)
    }

    async fn hotels_for(&self, stop: &Stop, request: &SearchRequest) -> (String, Vec<ProviderOffer>) {
        let check_in = stop.check_in.to_string();
        let check_out = stop.check_out.to_string();
        let occupancy = occupancy_key(&request.travelers);
        let hint = accommodation_key(request.preferences.accommodation);
        let cache_key = create_cache_key(
            ProviderCategory::Hotels,
            &stop.destination,
            &[&check_in, &check_out, &occupancy, hint],
        );

        let call = self.providers.hotels.search(
            &stop.destination,
            stop.check_in,
            stop.check_out,
            &request.travelers,
            request.preferences.accommodation,
        );
        let offers = self
            .query_offers(ProviderCategory::Hotels, &stop.destination, cache_key, call, || {
                self.fallback
                    .hotels(stop, &request.travelers, &request.currency)
            })
            .await;
        (stop.destination.clone(), offers)
    }

    async fn activities_for(&self, stop: &Stop, request: &SearchRequest) -> (String, Vec<ProviderOffer>) {
        let preferences = &request.preferences;
        let interests = interests_key(&preferences.interests);
        let cache_key = create_cache_key(
            ProviderCategory::Activities,
            &stop.destination,
            &[
                accommodation_key(preferences.accommodation),
                pace_key(preferences.pace),
                &interests,
            ],
        );

        let call = self
            .providers
            .activities
            .search(&stop.destination, &request.preferences);
        let offers = self
            .query_offers(ProviderCategory::Activities, &stop.destination, cache_key, call, || {
                self.fallback.activities(
                    &stop.destination,
                    stop.check_in,
                    &request.travelers,
                    &request.preferences,
                    &request.currency,
                )
            })
            .await;
        (stop.destination.clone(), offers)
    }

    async fn weather_for(&self, stop: &Stop) -> (String, WeatherSummary) {
        let call = self
            .providers
            .weather
            .forecast(&stop.destination, stop.check_in, stop.check_out);

        let summary = match self.bounded(call).await {
            Ok(summary) => summary,
            Err(error) => {
                warn!(
                    category = %ProviderCategory::Weather,
                    key = %stop.destination,
                    error = %error,
                    "provider query failed, using fallback"
                );
                self.fallback
                    .weather(&stop.destination, stop.check_in, stop.check_out)
            }
        };
        (stop.destination.clone(), summary)
    }

    // Cache first, then the live call; a failed call is replaced exactly once, never retried
    async fn query_offers<C, F>(
        &self,
        category: ProviderCategory,
        key: &str,
        cache_key: String,
        call: C,
        fallback: F,
    ) -> Vec<ProviderOffer>
    where
        C: Future<Output = Result<Vec<ProviderOffer>, ProviderError>>,
        F: FnOnce() -> Vec<ProviderOffer>,
    {
        let cache = self.cache.as_ref().filter(|cache| cache.is_enabled());

        if let Some(cache) = cache {
            if let Some(offers) = cache.get(&cache_key) {
                debug!(%category, key, "serving offers from cache");
                return offers;
            }
            debug!(%category, key, "cache miss");
        }

        match self.bounded(call).await {
            Ok(offers) => {
                if let Some(cache) = cache {
                    cache.store(&cache_key, &offers, None);
                }
                offers
            }
            Err(error) => {
                warn!(
                    %category,
                    key,
                    error = %error,
                    "provider query failed, using fallback"
                );
                fallback()
            }
        }
    }

    async fn bounded<T, C>(&self, call: C) -> Result<T, ProviderError>
    where
        C: Future<Output = Result<T, ProviderError>>,
    {
        let limit = self.config.provider_timeout_ms;
        timeout(Duration::from_millis(limit), call)
            .await
            .unwrap_or(Err(ProviderError::Timeout(limit)))
    }
}

fn occupancy_key(travelers: &TravelerCounts) -> String {
    format!("{}a{}c{}i", travelers.adults, travelers.children, travelers.infants)
}

fn accommodation_key(tier: Option<AccommodationTier>) -> &'static str {
    match tier {
        None => "any",
        Some(AccommodationTier::Budget) => "budget",
        Some(AccommodationTier::MidRange) => "mid_range",
        Some(AccommodationTier::Luxury) => "luxury",
    }
}

fn pace_key(pace: Option<Pace>) -> &'static str {
    match pace {
        None => "any",
        Some(Pace::Relaxed) => "relaxed",
        Some(Pace::Moderate) => "moderate",
        Some(Pace::Packed) => "packed",
    }
}

// Interest matching ignores case and order
fn interests_key(interests: &[String]) -> String {
    let mut normalized: Vec<String> = interests
        .iter()
        .map(|interest| interest.to_ascii_lowercase())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized.join(",")
}
