//! End-to-end checks of the merge, dedup and shaping behavior the crawl
//! pipeline relies on.

use proxypool::models::proxy::{Base, Shadowsocks};
use proxypool::{parse_proxy_link, Proxy, ProxyDetail, ProxyList, ProxyListOps};

fn ss(server: &str, password: &str) -> Proxy {
    Proxy::new(
        Base {
            server: server.to_string(),
            port: 443,
            udp: true,
            ..Default::default()
        },
        ProxyDetail::Shadowsocks(Shadowsocks {
            password: password.to_string(),
            cipher: "aes-256-gcm".to_string(),
            ..Default::default()
        }),
    )
}

/// The interleaved-duplicates stream from the merge contract.
fn duplicate_stream() -> ProxyList {
    vec![
        ss("a.example", "1"),
        ss("b.example", "1"),
        ss("a.example", "1"),
        ss("c.example", "1"),
        ss("b.example", "1"),
    ]
}

fn merge_mode_0(stream: ProxyList) -> ProxyList {
    let mut merged = ProxyList::new();
    for p in stream {
        merged.uniq_append(p);
    }
    merged
}

fn merge_mode_1(stream: ProxyList) -> ProxyList {
    let mut merged = ProxyList::new();
    let mut ids = std::collections::HashSet::new();
    for p in stream {
        if ids.insert(p.identifier()) {
            merged.push(p);
        }
    }
    merged
}

fn merge_mode_2(stream: ProxyList) -> ProxyList {
    stream.deduplication()
}

#[test]
fn merge_modes_agree_on_first_occurrence_order() {
    let mode0 = merge_mode_0(duplicate_stream());
    let mode1 = merge_mode_1(duplicate_stream());
    assert_eq!(mode0, mode1);
    let servers: Vec<&str> = mode1.iter().map(|p| p.base.server.as_str()).collect();
    assert_eq!(servers, vec!["a.example", "b.example", "c.example"]);
}

#[test]
fn merge_mode_2_is_a_permutation_of_the_others() {
    let mode1 = merge_mode_1(duplicate_stream());
    let mode2 = merge_mode_2(duplicate_stream());
    let mut ids1: Vec<String> = mode1.iter().map(|p| p.identifier()).collect();
    let mut ids2: Vec<String> = mode2.iter().map(|p| p.identifier()).collect();
    ids1.sort();
    ids2.sort();
    assert_eq!(ids1, ids2);
}

#[test]
fn dedup_is_idempotent() {
    let once = duplicate_stream().deduplication();
    assert_eq!(once.clone().deduplication(), once);
}

#[test]
fn shaping_keeps_identifiers_stable() {
    let mut pool = duplicate_stream().deduplication();
    let ids_before: Vec<String> = pool.iter().map(|p| p.identifier()).collect();
    for (i, p) in pool.iter_mut().enumerate() {
        p.set_country(if i % 2 == 0 { "US" } else { "DE" });
    }
    pool.name_clear();
    pool.name_add_country();
    pool.sort_by_country_type();
    pool.name_add_index();
    let mut ids_after: Vec<String> = pool.iter().map(|p| p.identifier()).collect();
    let mut ids_before_sorted = ids_before.clone();
    ids_before_sorted.sort();
    ids_after.sort();
    assert_eq!(ids_before_sorted, ids_after);
}

#[test]
fn shaped_names_are_country_and_index() {
    let mut pool = vec![ss("a.example", "1"), ss("b.example", "2")];
    for p in pool.iter_mut() {
        p.set_country("US");
    }
    pool.name_clear();
    pool.name_add_country();
    pool.sort_by_country_type();
    pool.name_add_index();
    assert_eq!(pool[0].base.name, "US_01");
    assert_eq!(pool[1].base.name, "US_02");
}

#[test]
fn parsed_links_enter_the_pool_deduplicated() {
    let links = [
        "ss://YWVzLTI1Ni1nY206eA==@1.1.1.1:443#one",
        "ss://YWVzLTI1Ni1nY206eA==@1.1.1.1:443#two",
        "trojan://pw@2.2.2.2:443?sni=x",
    ];
    let pool: ProxyList = links
        .iter()
        .filter_map(|l| parse_proxy_link(l).ok())
        .collect::<ProxyList>()
        .deduplication();
    assert_eq!(pool.len(), 2);
}

#[test]
fn derive_expands_and_dedups() {
    let mut convertible = ss("a.example", "1");
    if let ProxyDetail::Shadowsocks(inner) = &mut convertible.detail {
        inner.cipher = "aes-256-cfb".to_string();
    }
    let pool = vec![convertible.clone(), convertible].derive();
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.type_len("ss"), 1);
    assert_eq!(pool.type_len("ssr"), 1);
}
