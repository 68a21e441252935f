// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

use crate::error::Result;

/// Query parameter carrying the list page number.
pub const PAGE_PARAM: &str = "p";

/// Resolve a potentially relative href against a base URL.
///
/// # Examples
/// ```
/// use inven_crawler::utils::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://m.inven.co.kr/board/lostark/5558").unwrap();
/// assert_eq!(
///     resolve(&base, "/board/lostark/5558/1?x=1").unwrap().as_str(),
///     "https://m.inven.co.kr/board/lostark/5558/1?x=1"
/// );
/// ```
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Build the URL of list page `page`.
///
/// Page 1 is the base URL untouched. Later pages set or overwrite the page
/// parameter and keep every other query parameter in order.
pub fn list_page_url(base_url: &str, page: usize) -> Result<String> {
    if page <= 1 {
        return Ok(base_url.to_string());
    }

    let mut url = Url::parse(base_url)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(PAGE_PARAM, &page.to_string());

    Ok(url.to_string())
}
