//! Telegram group adapter: page-wise pulls of the companion API, grepping
//! links and subscription URLs out of the combined payload.

use async_trait::async_trait;
use log::debug;

use crate::config;
use crate::getter::subscribe::Subscribe;
use crate::getter::{
    find_all_subscribe_url, fuzz_parse_proxies, option_num, option_string, Getter, GetterError,
    Options,
};
use crate::models::ProxyList;
use crate::utils::http::web_get;
use crate::utils::string::html_unescape;

const DEFAULT_NUM: usize = 200;
const PAGE_SIZE: usize = 100;

pub struct TgGroup {
    channel: String,
    num_needed: usize,
    url: String,
}

pub fn create(options: &Options) -> Result<Box<dyn Getter>, GetterError> {
    let channel = option_string(options, "channel", GetterError::ChannelNotFound)?;
    let num_needed = option_num(options, "num", DEFAULT_NUM);
    let cfg = config::current();
    Ok(Box::new(TgGroup {
        url: format!("{}{}", cfg.tg_file_api, channel),
        channel,
        num_needed,
    }))
}

impl TgGroup {
    async fn fetch_pages(&self) -> Vec<String> {
        let mut pages = Vec::new();
        let mut page_num = 1;
        let mut remaining = self.num_needed as isize;
        while remaining > 0 {
            let page_url = format!("{}/{}?limit={}", self.url, page_num, PAGE_SIZE);
            match web_get(&page_url).await {
                Ok(body) => pages.push(body),
                Err(e) => {
                    debug!("tggroup page fetch failed: {} url={}", e, page_url);
                    break;
                }
            }
            page_num += 1;
            remaining -= PAGE_SIZE as isize;
        }
        pages
    }
}

#[async_trait]
impl Getter for TgGroup {
    async fn get(&self) -> ProxyList {
        let pages = self.fetch_pages().await;
        if pages.is_empty() {
            return ProxyList::new();
        }
        let all = pages.join(" ");

        let mut result = fuzz_parse_proxies(&all);

        for sub_url in find_all_subscribe_url(&html_unescape(&all), None) {
            if sub_url.starts_with("https://t.me") {
                continue;
            }
            let nodes = Subscribe { url: sub_url.clone() }.get_nodes().await;
            if !nodes.is_empty() {
                debug!(
                    "STATISTIC: TGgroup Subscribe count={:<5} url={}",
                    nodes.len(),
                    sub_url
                );
                result.extend(nodes);
            }
        }

        result
    }

    fn kind(&self) -> &'static str {
        "TGGroup"
    }

    fn source(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_channel() {
        let options = Options::new();
        assert!(matches!(create(&options), Err(GetterError::ChannelNotFound)));
    }

    #[test]
    fn test_num_option_accepts_float() {
        let mut options = Options::new();
        options.insert(
            serde_yaml::Value::from("channel"),
            serde_yaml::Value::from("grp"),
        );
        options.insert(serde_yaml::Value::from("num"), serde_yaml::Value::from(250.0));
        assert!(create(&options).is_ok());
    }
}
