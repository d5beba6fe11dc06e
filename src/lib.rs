// Main library file for the trip package composition engine

// Request, offer and result models
pub mod offer;
pub mod result_set;
pub mod search;

// Composition pipeline
pub mod composer;
pub mod fallback;
pub mod service;
pub mod tier_selector;

// Provider collaborators and their plumbing
pub mod config;
pub mod hotel_supplier;
pub mod offer_cache;
pub mod provider;
pub mod supplier_xml;

#[cfg(test)]
mod fixtures;

// Re-export key types for convenience
pub use composer::{PackageComposer, PriceBreakdown, TripPackage};
pub use config::{ConfigError, ServiceConfig};
pub use fallback::FallbackGenerator;
pub use hotel_supplier::{SupplierConfig, XmlHotelSupplier};
pub use offer::{OfferDetails, Price, ProviderCategory, ProviderOffer, WeatherSummary};
pub use offer_cache::{OfferCache, OfferCacheConfig};
pub use provider::{
    ActivitySearch, FlightSearch, HotelSearch, ProviderError, Providers, WeatherProvider,
};
pub use result_set::{ProviderResultSet, RawResults};
pub use search::{CabinClass, Itinerary, Preferences, SearchRequest, TravelerCounts, ValidationError};
pub use service::{CompositionResponse, ServiceError, TripPackageService};
pub use tier_selector::{CompositionError, Tier, TierSelection, TierSelector};
