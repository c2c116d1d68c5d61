//! Typed procedure wrappers, one per API area.
//!
//! Each wrapper borrows the [`ApiClient`] and only fixes the procedure name,
//! HTTP method and parameter names; every call still goes through the
//! client's retry loop.

use serde_json::{json, Value};

use super::{ApiClient, ApiError, Method};
use crate::retry::RetryError;

pub type ApiResult = Result<Value, RetryError<ApiError>>;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const DEFAULT_FORECAST_DAYS: u32 = 7;
pub const DEFAULT_SUMMARY_MONTHS: u32 = 12;

/// `limit`/`offset` paging for list procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// Optional `startDate`/`endDate` bounds, passed through as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Marketplace product search; unset fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Query parameters in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
struct Params(Vec<(&'static str, String)>);

impl Params {
    fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    fn with_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    fn id(id: u64) -> Self {
        Self::default().with("id", id)
    }

    fn farm(farm_id: u64) -> Self {
        Self::default().with("farmId", farm_id)
    }

    fn page(page: Page) -> Self {
        Self::default()
            .with("limit", page.limit)
            .with("offset", page.offset)
    }

    fn dates(self, range: &DateRange) -> Self {
        self.with_opt("startDate", range.start.as_deref())
            .with_opt("endDate", range.end.as_deref())
    }

    fn pairs(&self) -> Vec<(&str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }
}

async fn call(
    client: &ApiClient,
    method: Method,
    procedure: &str,
    params: Params,
    body: Option<&Value>,
) -> ApiResult {
    client.request(method, procedure, &params.pairs(), body).await
}

impl ApiClient {
    pub fn farms(&self) -> Farms<'_> {
        Farms { client: self }
    }

    pub fn crops(&self) -> Crops<'_> {
        Crops { client: self }
    }

    pub fn livestock(&self) -> Livestock<'_> {
        Livestock { client: self }
    }

    pub fn breeding(&self) -> Breeding<'_> {
        Breeding { client: self }
    }

    pub fn marketplace(&self) -> Marketplace<'_> {
        Marketplace { client: self }
    }

    pub fn weather(&self) -> Weather<'_> {
        Weather { client: self }
    }

    pub fn financial(&self) -> Financial<'_> {
        Financial { client: self }
    }

    pub fn notifications(&self) -> Notifications<'_> {
        Notifications { client: self }
    }
}

/// `farms.*`
#[derive(Debug, Clone, Copy)]
pub struct Farms<'a> {
    client: &'a ApiClient,
}

impl Farms<'_> {
    pub async fn list(&self, page: Page) -> ApiResult {
        call(self.client, Method::Get, "farms.list", Params::page(page), None).await
    }

    pub async fn get(&self, farm_id: u64) -> ApiResult {
        call(self.client, Method::Get, "farms.get", Params::id(farm_id), None).await
    }

    pub async fn create(&self, data: &Value) -> ApiResult {
        call(self.client, Method::Post, "farms.create", Params::default(), Some(data)).await
    }

    /// `PUT` with the id in the query and the changes in the body.
    pub async fn update(&self, farm_id: u64, data: &Value) -> ApiResult {
        call(self.client, Method::Put, "farms.update", Params::id(farm_id), Some(data)).await
    }

    pub async fn delete(&self, farm_id: u64) -> ApiResult {
        call(self.client, Method::Delete, "farms.delete", Params::id(farm_id), None).await
    }
}

/// `crops.*`
#[derive(Debug, Clone, Copy)]
pub struct Crops<'a> {
    client: &'a ApiClient,
}

impl Crops<'_> {
    pub async fn list(&self, farm_id: u64, status: Option<&str>) -> ApiResult {
        let params = Params::farm(farm_id).with_opt("status", status);
        call(self.client, Method::Get, "crops.list", params, None).await
    }

    pub async fn get(&self, crop_id: u64) -> ApiResult {
        call(self.client, Method::Get, "crops.get", Params::id(crop_id), None).await
    }

    pub async fn create(&self, data: &Value) -> ApiResult {
        call(self.client, Method::Post, "crops.create", Params::default(), Some(data)).await
    }

    pub async fn analytics(&self, crop_id: u64) -> ApiResult {
        self.by_crop("crops.getAnalytics", crop_id).await
    }

    pub async fn soil_tests(&self, crop_id: u64) -> ApiResult {
        self.by_crop("crops.getSoilTests", crop_id).await
    }

    pub async fn yield_records(&self, crop_id: u64) -> ApiResult {
        self.by_crop("crops.getYieldRecords", crop_id).await
    }

    async fn by_crop(&self, procedure: &str, crop_id: u64) -> ApiResult {
        let params = Params::default().with("cropId", crop_id);
        call(self.client, Method::Get, procedure, params, None).await
    }
}

/// `livestock.*`
#[derive(Debug, Clone, Copy)]
pub struct Livestock<'a> {
    client: &'a ApiClient,
}

impl Livestock<'_> {
    pub async fn list(&self, farm_id: u64, animal_type: Option<&str>) -> ApiResult {
        let params = Params::farm(farm_id).with_opt("type", animal_type);
        call(self.client, Method::Get, "livestock.list", params, None).await
    }

    pub async fn get(&self, animal_id: u64) -> ApiResult {
        call(self.client, Method::Get, "livestock.get", Params::id(animal_id), None).await
    }

    pub async fn create(&self, data: &Value) -> ApiResult {
        call(self.client, Method::Post, "livestock.create", Params::default(), Some(data)).await
    }

    pub async fn health_records(&self, animal_id: u64) -> ApiResult {
        let params = Params::default().with("animalId", animal_id);
        call(self.client, Method::Get, "livestock.getHealthRecords", params, None).await
    }

    pub async fn add_health_record(&self, data: &Value) -> ApiResult {
        let procedure = "livestock.addHealthRecord";
        call(self.client, Method::Post, procedure, Params::default(), Some(data)).await
    }
}

/// `breeding.*`
#[derive(Debug, Clone, Copy)]
pub struct Breeding<'a> {
    client: &'a ApiClient,
}

impl Breeding<'_> {
    pub async fn records(&self, farm_id: u64) -> ApiResult {
        call(self.client, Method::Get, "breeding.getRecords", Params::farm(farm_id), None).await
    }

    pub async fn analytics(&self, farm_id: u64) -> ApiResult {
        call(self.client, Method::Get, "breeding.getAnalytics", Params::farm(farm_id), None).await
    }

    pub async fn compatibility(&self, animal1_id: u64, animal2_id: u64) -> ApiResult {
        let params = Params::default()
            .with("animal1Id", animal1_id)
            .with("animal2Id", animal2_id);
        call(self.client, Method::Get, "breeding.calculateCompatibility", params, None).await
    }

    pub async fn recommendations(&self, farm_id: u64) -> ApiResult {
        let procedure = "breeding.getRecommendations";
        call(self.client, Method::Get, procedure, Params::farm(farm_id), None).await
    }
}

/// `marketplace.*`
#[derive(Debug, Clone, Copy)]
pub struct Marketplace<'a> {
    client: &'a ApiClient,
}

impl Marketplace<'_> {
    pub async fn products(&self, filter: &ProductFilter) -> ApiResult {
        let params = Params::default()
            .with_opt("search", filter.search.as_deref())
            .with_opt("category", filter.category.as_deref())
            .with_opt("minPrice", filter.min_price)
            .with_opt("maxPrice", filter.max_price);
        call(self.client, Method::Get, "marketplace.products", params, None).await
    }

    pub async fn product(&self, product_id: u64) -> ApiResult {
        call(self.client, Method::Get, "marketplace.getProduct", Params::id(product_id), None).await
    }

    pub async fn create_order(&self, data: &Value) -> ApiResult {
        let procedure = "marketplace.createOrder";
        call(self.client, Method::Post, procedure, Params::default(), Some(data)).await
    }

    pub async fn orders(&self) -> ApiResult {
        call(self.client, Method::Get, "marketplace.getOrders", Params::default(), None).await
    }

    pub async fn cart(&self) -> ApiResult {
        call(self.client, Method::Get, "marketplace.getCart", Params::default(), None).await
    }

    pub async fn add_to_cart(&self, product_id: u64, quantity: u32) -> ApiResult {
        let body = json!({ "productId": product_id, "quantity": quantity });
        let procedure = "marketplace.addToCart";
        call(self.client, Method::Post, procedure, Params::default(), Some(&body)).await
    }

    pub async fn remove_from_cart(&self, product_id: u64) -> ApiResult {
        let body = json!({ "productId": product_id });
        let procedure = "marketplace.removeFromCart";
        call(self.client, Method::Post, procedure, Params::default(), Some(&body)).await
    }
}

/// `weather.*`
#[derive(Debug, Clone, Copy)]
pub struct Weather<'a> {
    client: &'a ApiClient,
}

impl Weather<'_> {
    /// Forecast for `days` days, [`DEFAULT_FORECAST_DAYS`] when `None`.
    pub async fn forecast(&self, farm_id: u64, days: Option<u32>) -> ApiResult {
        let params = Params::farm(farm_id).with("days", days.unwrap_or(DEFAULT_FORECAST_DAYS));
        call(self.client, Method::Get, "weather.forecast", params, None).await
    }

    pub async fn alerts(&self, farm_id: u64) -> ApiResult {
        call(self.client, Method::Get, "weather.getAlerts", Params::farm(farm_id), None).await
    }

    pub async fn crop_recommendations(&self, farm_id: u64) -> ApiResult {
        let procedure = "weather.getCropRecommendations";
        call(self.client, Method::Get, procedure, Params::farm(farm_id), None).await
    }
}

/// `financial.*`
#[derive(Debug, Clone, Copy)]
pub struct Financial<'a> {
    client: &'a ApiClient,
}

impl Financial<'_> {
    pub async fn expenses(&self, farm_id: u64, range: &DateRange) -> ApiResult {
        let params = Params::farm(farm_id).dates(range);
        call(self.client, Method::Get, "financial.getExpenses", params, None).await
    }

    pub async fn revenue(&self, farm_id: u64, range: &DateRange) -> ApiResult {
        let params = Params::farm(farm_id).dates(range);
        call(self.client, Method::Get, "financial.getRevenue", params, None).await
    }

    /// Summary over `months` months, [`DEFAULT_SUMMARY_MONTHS`] when `None`.
    pub async fn summary(&self, farm_id: u64, months: Option<u32>) -> ApiResult {
        let params =
            Params::farm(farm_id).with("months", months.unwrap_or(DEFAULT_SUMMARY_MONTHS));
        call(self.client, Method::Get, "financial.getSummary", params, None).await
    }

    pub async fn add_expense(&self, data: &Value) -> ApiResult {
        let procedure = "financial.addExpense";
        call(self.client, Method::Post, procedure, Params::default(), Some(data)).await
    }

    pub async fn add_revenue(&self, data: &Value) -> ApiResult {
        let procedure = "financial.addRevenue";
        call(self.client, Method::Post, procedure, Params::default(), Some(data)).await
    }
}

/// `notifications.*`
#[derive(Debug, Clone, Copy)]
pub struct Notifications<'a> {
    client: &'a ApiClient,
}

impl Notifications<'_> {
    /// `read` filters by read state when set.
    pub async fn list(&self, page: Page, read: Option<bool>) -> ApiResult {
        let params = Params::page(page).with_opt("read", read);
        call(self.client, Method::Get, "notifications.list", params, None).await
    }

    /// `POST` with the id in the query and no body.
    pub async fn mark_as_read(&self, notification_id: u64) -> ApiResult {
        let params = Params::id(notification_id);
        call(self.client, Method::Post, "notifications.markAsRead", params, None).await
    }

    pub async fn mark_all_as_read(&self) -> ApiResult {
        let procedure = "notifications.markAllAsRead";
        call(self.client, Method::Post, procedure, Params::default(), None).await
    }

    pub async fn delete(&self, notification_id: u64) -> ApiResult {
        let params = Params::id(notification_id);
        call(self.client, Method::Delete, "notifications.delete", params, None).await
    }

    pub async fn preferences(&self) -> ApiResult {
        let procedure = "notifications.getPreferences";
        call(self.client, Method::Get, procedure, Params::default(), None).await
    }

    pub async fn update_preferences(&self, data: &Value) -> ApiResult {
        let procedure = "notifications.updatePreferences";
        call(self.client, Method::Put, procedure, Params::default(), Some(data)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_matches_list_defaults() {
        assert_eq!(
            Params::page(Page::default()).pairs(),
            vec![("limit", "10"), ("offset", "0")]
        );
    }

    #[test]
    fn unset_options_are_left_out() {
        let params = Params::farm(3).with_opt("status", None::<&str>);
        assert_eq!(params.pairs(), vec![("farmId", "3")]);

        let range = DateRange {
            start: Some("2024-01-01".into()),
            end: None,
        };
        assert_eq!(
            Params::farm(3).dates(&range).pairs(),
            vec![("farmId", "3"), ("startDate", "2024-01-01")]
        );
    }

    #[test]
    fn values_are_stringified() {
        let params = Params::default()
            .with_opt("minPrice", Some(12.5))
            .with_opt("maxPrice", Some(40.0))
            .with_opt("read", Some(false));
        assert_eq!(
            params.pairs(),
            vec![("minPrice", "12.5"), ("maxPrice", "40"), ("read", "false")]
        );
    }
}
