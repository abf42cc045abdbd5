//! Telegram channel adapter: scrapes the public preview pages and pulls the
//! RSS companion API for attached subscription files.

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::debug;
use scraper::{Html, Selector};
use url::Url;

use crate::config;
use crate::getter::subscribe::Subscribe;
use crate::getter::{
    find_all_subscribe_url, option_num, option_string, string_array_to_proxies, Getter,
    GetterError, Options,
};
use crate::models::ProxyList;
use crate::parser::grep_links_from_string;
use crate::utils::http::web_get;
use crate::utils::string::html_unescape;

const DEFAULT_NUM: usize = 200;

lazy_static! {
    static ref MESSAGE_SEL: Selector =
        Selector::parse("div.tgme_widget_message_text").expect("message selector");
    static ref PREV_SEL: Selector = Selector::parse("link[rel=prev]").expect("prev selector");
}

pub struct TgChannel {
    channel: String,
    num_needed: usize,
    url: String,
    api_url: String,
}

pub fn create(options: &Options) -> Result<Box<dyn Getter>, GetterError> {
    let channel = option_string(options, "channel", GetterError::ChannelNotFound)?;
    let num_needed = option_num(options, "num", DEFAULT_NUM);
    let cfg = config::current();
    Ok(Box::new(TgChannel {
        url: format!("https://t.me/s/{}", channel),
        api_url: format!("{}{}?limit=30", cfg.tg_file_api, channel),
        channel,
        num_needed,
    }))
}

impl TgChannel {
    /// Walks the message pages backwards until enough links are collected.
    /// Returns the grepped links and the raw message texts.
    async fn scrape_pages(&self) -> (Vec<String>, Vec<String>) {
        let mut links = Vec::new();
        let mut texts = Vec::new();
        let mut messages_seen = 0usize;
        let mut visited = std::collections::HashSet::new();
        let mut page_url = self.url.clone();

        while visited.insert(page_url.clone()) {
            let body = match web_get(&page_url).await {
                Ok(body) => body,
                Err(e) => {
                    debug!("tgchannel page fetch failed: {} url={}", e, page_url);
                    break;
                }
            };

            let prev = {
                let doc = Html::parse_document(&body);
                for element in doc.select(&MESSAGE_SEL) {
                    let text = element.text().collect::<Vec<_>>().join(" ");
                    links.extend(grep_links_from_string(&text));
                    texts.push(html_unescape(&text));
                    messages_seen += 1;
                }
                doc.select(&PREV_SEL)
                    .next()
                    .and_then(|e| e.value().attr("href"))
                    .map(|h| h.to_string())
            };

            if links.len() >= self.num_needed || messages_seen >= self.num_needed {
                break;
            }
            match prev.and_then(|href| resolve_href(&page_url, &href)) {
                Some(next) => page_url = next,
                None => break,
            }
        }
        (links, texts)
    }

    /// The companion API serves an RSS-like stream; `enclosure url` entries
    /// point at attached subscription files.
    async fn api_enclosure_urls(&self) -> Vec<String> {
        let body = match web_get(&self.api_url).await {
            Ok(body) => body,
            Err(e) => {
                debug!("tgchannel api fetch failed: {} url={}", e, self.api_url);
                return Vec::new();
            }
        };
        let mut urls = Vec::new();
        for line in body.lines() {
            if !line.contains("enclosure url") {
                continue;
            }
            for element in line.split('"') {
                if element.contains("https://") || element.contains("http://") {
                    urls.push(element.to_string());
                }
            }
        }
        urls
    }
}

fn resolve_href(base: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    Url::parse(base)
        .ok()?
        .join(href)
        .ok()
        .map(|u| u.to_string())
}

#[async_trait]
impl Getter for TgChannel {
    async fn get(&self) -> ProxyList {
        let (links, texts) = self.scrape_pages().await;
        let mut result = string_array_to_proxies(links);

        // plain subscription URLs found inside message text
        for sub_url in find_all_subscribe_url(&texts.join(" "), None) {
            if sub_url.starts_with("https://t.me") {
                continue;
            }
            let nodes = Subscribe { url: sub_url.clone() }.get_nodes().await;
            if !nodes.is_empty() {
                debug!(
                    "STATISTIC: TGchannel Subscribe count={:<5} url={}",
                    nodes.len(),
                    sub_url
                );
                result.extend(nodes);
            } else {
                debug!("STATISTIC: TGchannel Subscribe url={}", sub_url);
            }
        }

        // attached files are one-shot: pulled once, then pinned
        for enclosure in self.api_enclosure_urls().await {
            for sub_url in find_all_subscribe_url(&enclosure, None) {
                if sub_url.starts_with("https://t.me") {
                    continue;
                }
                result.extend(Subscribe { url: sub_url }.get_and_block().await);
            }
        }

        result
    }

    fn kind(&self) -> &'static str {
        "TGChannel"
    }

    fn source(&self) -> String {
        format!("https://t.me/s/{}", self.channel)
    }
}
