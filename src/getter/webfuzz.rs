//! Fuzzy web source: any page that might contain subscription URLs.

use async_trait::async_trait;
use log::debug;

use crate::getter::subscribe::Subscribe;
use crate::getter::{find_all_subscribe_url, option_string, Getter, GetterError, Options};
use crate::models::ProxyList;
use crate::utils::http::web_get;

pub struct WebFuzzSub {
    pub url: String,
}

pub fn create(options: &Options) -> Result<Box<dyn Getter>, GetterError> {
    let url = option_string(options, "url", GetterError::UrlNotFound)?;
    Ok(Box::new(WebFuzzSub { url }))
}

#[async_trait]
impl Getter for WebFuzzSub {
    async fn get(&self) -> ProxyList {
        let body = match web_get(&self.url).await {
            Ok(body) => body,
            Err(e) => {
                debug!("webfuzzsub fetch failed: {} url={}", e, self.url);
                return ProxyList::new();
            }
        };
        let sub_urls = find_all_subscribe_url(&body, None);
        Subscribe::queue_get(sub_urls).await
    }

    fn kind(&self) -> &'static str {
        "WebFuzzSub"
    }

    fn source(&self) -> String {
        self.url.clone()
    }
}
