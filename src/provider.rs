// Provider collaborators: flight, hotel, activity and weather searches
// Live providers are unreliable; every error here is absorbed by the service and replaced with
// fallback offers, so implementations should fail fast rather than retry.

use crate::offer::{ProviderOffer, WeatherSummary};
use crate::search::{AccommodationTier, CabinClass, Preferences, TravelerCounts};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Malformed provider payload: {0}")]
    MalformedPayload(String),

    #[error("Other error: {0}")]
    Other(String),
}

#[async_trait]
pub trait FlightSearch: Send + Sync + 'static {
    // Offers for one leg, each priced for the whole party
    async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        travelers: &TravelerCounts,
        cabin: CabinClass,
    ) -> Result<Vec<ProviderOffer>, ProviderError>;
}

#[async_trait]
pub trait HotelSearch: Send + Sync + 'static {
    // Offers for one stay; price is the stay total
    async fn search(
        &self,
        destination: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        travelers: &TravelerCounts,
        budget_hint: Option<AccommodationTier>,
    ) -> Result<Vec<ProviderOffer>, ProviderError>;
}

#[async_trait]
pub trait ActivitySearch: Send + Sync + 'static {
    // Offers priced per adult
    async fn search(
        &self,
        destination: &str,
        preferences: &Preferences,
    ) -> Result<Vec<ProviderOffer>, ProviderError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + 'static {
    async fn forecast(
        &self,
        destination: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherSummary, ProviderError>;
}

// The four collaborators a composition needs
#[derive(Clone)]
pub struct Providers {
    pub flights: Arc<dyn FlightSearch>,
    pub hotels: Arc<dyn HotelSearch>,
    pub activities: Arc<dyn ActivitySearch>,
    pub weather: Arc<dyn WeatherProvider>,
}

impl Providers {
    pub fn new(
        flights: Arc<dyn FlightSearch>,
        hotels: Arc<dyn HotelSearch>,
        activities: Arc<dyn ActivitySearch>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            flights,
            hotels,
            activities,
            weather,
        }
    }

    // Same collaborator for every category
    pub fn uniform<P>(provider: Arc<P>) -> Self
    where
        P: FlightSearch + HotelSearch + ActivitySearch + WeatherProvider,
    {
        Self {
            flights: provider.clone(),
            hotels: provider.clone(),
            activities: provider.clone(),
            weather: provider,
        }
    }

    // Every call fails, so compositions run entirely on fallback offers
    pub fn offline() -> Self {
        Self::uniform(Arc::new(OfflineProvider))
    }
}

pub struct OfflineProvider;

impl OfflineProvider {
    fn unavailable<T>() -> Result<T, ProviderError> {
        Err(ProviderError::NetworkError(
            "provider is offline".to_string(),
        ))
    }
}

#[async_trait]
impl FlightSearch for OfflineProvider {
    async fn search(
        &self,
        _origin: &str,
        _destination: &str,
        _date: NaiveDate,
        _travelers: &TravelerCounts,
        _cabin: CabinClass,
    ) -> Result<Vec<ProviderOffer>, ProviderError> {
        Self::unavailable()
    }
}

#[async_trait]
impl HotelSearch for OfflineProvider {
    async fn search(
        &self,
        _destination: &str,
        _check_in: NaiveDate,
        _check_out: NaiveDate,
        _travelers: &TravelerCounts,
        _budget_hint: Option<AccommodationTier>,
    ) -> Result<Vec<ProviderOffer>, ProviderError> {
        Self::unavailable()
    }
}

#[async_trait]
impl ActivitySearch for OfflineProvider {
    async fn search(
        &self,
        _destination: &str,
        _preferences: &Preferences,
    ) -> Result<Vec<ProviderOffer>, ProviderError> {
        Self::unavailable()
    }
}

#[async_trait]
impl WeatherProvider for OfflineProvider {
    async fn forecast(
        &self,
        _destination: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<WeatherSummary, ProviderError> {
        Self::unavailable()
    }
}
