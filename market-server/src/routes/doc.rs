use utoipa::OpenApi;

use crate::routes::{console, health};

#[derive(OpenApi)]
#[openapi(info(
    title = "market-server",
    description = "App marketplace API",
    version = "0.1.0",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(console::api_docs());
    root
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn document_lists_market_routes() {
        let doc = get_docs();
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/console/api/market-apps"));
        assert!(doc.paths.paths.contains_key("/console/api/market-apps/{id}"));
    }
}
