use super::*;
use reqwest::cookie::CookieStore;

fn cookie_header(mirror: &CookieMirror, url: &Url) -> Option<String> {
    mirror
        .jar()
        .cookies(url)
        .and_then(|value| value.to_str().ok().map(str::to_owned))
}

#[test]
fn access_cookie_plain_http() {
    assert_eq!(access_cookie("abc", false), "AccessToken=abc; Path=/; SameSite=Strict");
}

#[test]
fn access_cookie_secure_flag() {
    assert!(access_cookie("abc", true).ends_with("; Secure"));
}

#[test]
fn expired_cookie_is_in_the_past() {
    let cookie = expired_access_cookie();
    assert!(cookie.starts_with("AccessToken=;"));
    assert!(cookie.contains("1970"));
}

#[test]
fn mirror_set_exposes_cookie_to_backend_requests() {
    let url = Url::parse("http://127.0.0.1:8000/api").unwrap();
    let mirror = CookieMirror::new(Arc::new(Jar::default()), url.clone(), false);
    mirror.set("tok-1");

    let header = cookie_header(&mirror, &url).unwrap();
    assert!(header.contains("AccessToken=tok-1"));
}

#[test]
fn mirror_clear_drops_token() {
    let url = Url::parse("http://127.0.0.1:8000/api").unwrap();
    let mirror = CookieMirror::new(Arc::new(Jar::default()), url.clone(), false);
    mirror.set("tok-1");
    mirror.clear();

    let header = cookie_header(&mirror, &url).unwrap_or_default();
    assert!(!header.contains("tok-1"));
}

#[test]
fn secure_mirror_is_withheld_from_plain_http() {
    let jar = Arc::new(Jar::default());
    let https = Url::parse("https://folio.example.test/api").unwrap();
    let mirror = CookieMirror::new(jar.clone(), https.clone(), true);
    mirror.set("tok-1");

    assert!(cookie_header(&mirror, &https).unwrap().contains("AccessToken=tok-1"));
    let http = Url::parse("http://folio.example.test/api").unwrap();
    assert_eq!(cookie_header(&mirror, &http), None);
}
