use aqaar_listings::api::ApiTransport;
use aqaar_listings::ApiResult;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory backend: lookup collections by path and a fixed set of listing
/// pages served by the `page` query parameter.
#[derive(Default)]
pub struct MemoryBackend {
    routes: HashMap<String, Value>,
    pages: Vec<Value>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MemoryBackend {
    pub fn with_lookup(mut self, path: &str, items: &[(i64, &str, &str)]) -> Self {
        let body = items
            .iter()
            .map(|(id, ar, en)| json!({"id": id, "nameAr": ar, "nameEn": en}))
            .collect();
        self.routes.insert(path.to_string(), Value::Array(body));
        self
    }

    pub fn with_pages(mut self, pages: Vec<Value>) -> Self {
        self.pages = pages;
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiTransport for MemoryBackend {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), query.to_vec()));

        if path == "/consumer/GetAllProperty" {
            let index: usize = query
                .iter()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0);
            return self
                .pages
                .get(index)
                .cloned()
                .ok_or_else(|| aqaar_listings::ApiError::NotFound(format!("page {index}")));
        }

        self.routes
            .get(path)
            .cloned()
            .ok_or_else(|| aqaar_listings::ApiError::NotFound(path.to_string()))
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

pub fn listing(id: i64, price: f64, region: i64, listing_type: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Listing {id}"),
        "descriptionAr": "وصف",
        "descriptionEn": "Description",
        "price": price,
        "area": 150,
        "roomsCount": 3,
        "bathroomsCount": 2,
        "regionId": region,
        "cityId": 10,
        "propertyTypeId": 1,
        "listingTypeId": listing_type,
        "imageUrls": [],
        "features": [7]
    })
}

pub fn page(number: u32, content: Vec<Value>, last: bool, total: u64) -> Value {
    json!({
        "content": content,
        "number": number,
        "size": 2,
        "totalElements": total,
        "totalPages": 4,
        "first": number == 0,
        "last": last
    })
}
