//! Cipher, protocol and obfs tables used by validity checks.

use crate::utils::string::check_in_list;

pub const SS_CIPHERS: &[&str] = &[
    "aes-128-gcm",
    "aes-192-gcm",
    "aes-256-gcm",
    "aes-128-cfb",
    "aes-192-cfb",
    "aes-256-cfb",
    "aes-128-ctr",
    "aes-192-ctr",
    "aes-256-ctr",
    "rc4-md5",
    "chacha20-ietf",
    "xchacha20",
    "chacha20-ietf-poly1305",
    "xchacha20-ietf-poly1305",
    "none",
    "2022-blake3-aes-128-gcm",
    "2022-blake3-aes-256-gcm",
    "2022-blake3-chacha20-poly1305",
];

pub const SSR_CIPHERS: &[&str] = &[
    "aes-128-cfb",
    "aes-192-cfb",
    "aes-256-cfb",
    "aes-128-ctr",
    "aes-192-ctr",
    "aes-256-ctr",
    "aes-128-ofb",
    "aes-192-ofb",
    "aes-256-ofb",
    "des-cfb",
    "bf-cfb",
    "cast5-cfb",
    "rc4-md5",
    "chacha20",
    "chacha20-ietf",
    "salsa20",
    "camellia-128-cfb",
    "camellia-192-cfb",
    "camellia-256-cfb",
    "idea-cfb",
    "rc2-cfb",
    "seed-cfb",
    "rc4",
];

pub const SSR_PROTOCOLS: &[&str] = &[
    "origin",
    "verify_deflate",
    "verify_sha1",
    "auth_sha1",
    "auth_sha1_v2",
    "auth_sha1_v4",
    "auth_aes128_md5",
    "auth_aes128_sha1",
    "auth_chain_a",
    "auth_chain_b",
];

pub const SSR_OBFS_LIST: &[&str] = &[
    "plain",
    "http_simple",
    "http_post",
    "random_head",
    "tls1.2_ticket_auth",
    "tls1.2_ticket_fastauth",
];

pub const VMESS_CIPHERS: &[&str] = &["auto", "aes-128-gcm", "chacha20-poly1305", "none", "zero"];

pub fn check_ss_cipher(cipher: &str) -> bool {
    check_in_list(SS_CIPHERS, cipher)
}

pub fn check_ssr_cipher(cipher: &str) -> bool {
    check_in_list(SSR_CIPHERS, cipher)
}

pub fn check_ssr_protocol(protocol: &str) -> bool {
    check_in_list(SSR_PROTOCOLS, protocol)
}

pub fn check_ssr_obfs(obfs: &str) -> bool {
    check_in_list(SSR_OBFS_LIST, obfs)
}

pub fn check_vmess_cipher(cipher: &str) -> bool {
    if cipher.is_empty() {
        return true;
    }
    check_in_list(VMESS_CIPHERS, cipher)
}

pub fn check_vmess_uuid(uuid: &str) -> bool {
    uuid.len() == 36
}

pub fn check_vless_uuid(uuid: &str) -> bool {
    !uuid.is_empty()
}
