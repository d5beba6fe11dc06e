// Hotel supplier XML protocol: AvailRQ requests and AvailRS responses
use crate::offer::{HotelDetails, OfferDetails, Price, ProviderOffer};
use crate::provider::ProviderError;
use crate::search::TravelerCounts;
use chrono::NaiveDate;
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};

const SUPPLIER_DATE_FORMAT: &str = "%d/%m/%Y";
const DEFAULT_STAR_RATING: u8 = 3;

#[derive(Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename = "AvailRQ", rename_all = "PascalCase")]
pub struct AvailRequest {
    pub currency: String,
    pub nationality: String,
    pub start_date: String,
    pub end_date: String,
    pub destination: String,
    pub occupancy: XmlOccupancy,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct XmlOccupancy {
    #[serde(rename = "@adults")]
    pub adults: u32,
    #[serde(rename = "@children")]
    pub children: u32,
    #[serde(rename = "@infants")]
    pub infants: u32,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
#[serde(rename = "AvailRS")]
pub struct AvailResponse {
    pub hotels: XmlHotels,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlHotels {
    #[serde(rename = "Hotel")]
    pub hotels: Vec<XmlHotel>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlHotel {
    #[serde(rename = "@code")]
    pub hotel_id: String,
    #[serde(rename = "@name")]
    pub hotel_name: String,
    // Star category, e.g. "4" or "4*"
    #[serde(rename = "@category")]
    pub category: String,
    pub meal_plans: XmlMealPlans,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlMealPlans {
    #[serde(rename = "MealPlan")]
    pub meal_plans: Vec<XmlMealPlan>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlMealPlan {
    #[serde(rename = "@code")]
    pub code: String,
    pub options: XmlOptions,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlOptions {
    #[serde(rename = "Option")]
    pub options: Vec<XmlOption>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlOption {
    #[serde(rename = "@type")]
    pub option_type: String,
    #[serde(rename = "@status")]
    pub status: String,
    pub price: XmlPrice,
    pub rooms: XmlRooms,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlPrice {
    #[serde(rename = "@currency")]
    pub currency: String,
    #[serde(rename = "@amount")]
    pub amount: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlRooms {
    #[serde(rename = "Room")]
    pub rooms: Vec<XmlRoom>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlRoom {
    #[serde(rename = "@code")]
    pub code: String,
    #[serde(rename = "@description")]
    pub description: String,
    #[serde(rename = "@nonRefundable")]
    pub non_refundable: String,
}

impl XmlOption {
    fn is_available(&self) -> bool {
        self.status.eq_ignore_ascii_case("OK")
    }

    fn is_refundable(&self) -> bool {
        !self.rooms.rooms.is_empty()
            && self
                .rooms
                .rooms
                .iter()
                .all(|room| room.non_refundable.eq_ignore_ascii_case("false"))
    }

    fn amount(&self, hotel_id: &str) -> Result<f64, ProviderError> {
        self.price.amount.trim().parse().map_err(|_| {
            ProviderError::MalformedPayload(format!(
                "hotel {} has unparsable amount {:?}",
                hotel_id, self.price.amount
            ))
        })
    }
}

pub struct SearchParams<'a> {
    pub destination: &'a str,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub travelers: &'a TravelerCounts,
    pub currency: &'a str,
    pub nationality: &'a str,
}

pub fn build_request(params: &SearchParams<'_>) -> Result<String, ProviderError> {
    let request = AvailRequest {
        currency: params.currency.to_string(),
        nationality: params.nationality.to_string(),
        start_date: params.check_in.format(SUPPLIER_DATE_FORMAT).to_string(),
        end_date: params.check_out.format(SUPPLIER_DATE_FORMAT).to_string(),
        destination: params.destination.to_string(),
        occupancy: XmlOccupancy {
            adults: params.travelers.adults,
            children: params.travelers.children,
            infants: params.travelers.infants,
        },
    };

    quick_xml::se::to_string(&request).map_err(|e| ProviderError::Other(e.to_string()))
}

pub fn parse_response(xml: &str) -> Result<AvailResponse, ProviderError> {
    from_str(xml).map_err(|e| ProviderError::MalformedPayload(e.to_string()))
}

/// Turns an availability response into one hotel offer per hotel.
///
/// Each hotel is offered at its cheapest available option across all meal plans; the
/// offer price is that option's stay total and the nightly rate is derived from it.
/// Hotels without an available option are skipped.
pub fn normalize(
    response: &AvailResponse,
    params: &SearchParams<'_>,
    provider: &str,
) -> Result<Vec<ProviderOffer>, ProviderError> {
    let nights = (params.check_out - params.check_in).num_days().max(1) as u32;
    let mut offers = Vec::new();

    for hotel in &response.hotels.hotels {
        let mut cheapest: Option<(f64, &XmlMealPlan, &XmlOption)> = None;
        for meal_plan in &hotel.meal_plans.meal_plans {
            for option in meal_plan.options.options.iter().filter(|o| o.is_available()) {
                let amount = option.amount(&hotel.hotel_id)?;
                if cheapest.map_or(true, |(best, _, _)| amount < best) {
                    cheapest = Some((amount, meal_plan, option));
                }
            }
        }

        let Some((total, meal_plan, option)) = cheapest else {
            continue;
        };

        let mut amenities: Vec<String> = board_amenity(&meal_plan.code)
            .map(|amenity| vec![amenity.to_string()])
            .unwrap_or_default();
        if option.is_refundable() {
            amenities.push("free_cancellation".to_string());
        }

        let currency = if option.price.currency.is_empty() {
            params.currency
        } else {
            option.price.currency.as_str()
        };

        offers.push(ProviderOffer {
            id: format!("{}-{}", provider, hotel.hotel_id),
            provider: provider.to_string(),
            destination: params.destination.to_string(),
            price: Price::new(total, currency),
            synthetic: false,
            details: OfferDetails::Hotel(HotelDetails {
                name: hotel.hotel_name.clone(),
                star_rating: star_rating(&hotel.category),
                guest_rating: None,
                nightly_rate: (total / f64::from(nights) * 100.0).round() / 100.0,
                nights,
                check_in: params.check_in,
                check_out: params.check_out,
                amenities,
            }),
        });
    }

    Ok(offers)
}

fn star_rating(category: &str) -> u8 {
    let digits: String = category
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<u8>()
        .map(|stars| stars.clamp(1, 5))
        .unwrap_or(DEFAULT_STAR_RATING)
}

fn board_amenity(code: &str) -> Option<&'static str> {
    match code {
        "BB" => Some("breakfast"),
        "HB" => Some("half_board"),
        "FB" => Some("full_board"),
        "AI" => Some("all_inclusive"),
        _ => None,
    }
}
