//! Product extraction from a search results page.

use scrape_types::{ProductRecord, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const RESULT_ITEM: &str = "div[data-component-type='s-search-result']";
const NAME: &str = "h2 a span";
const NAME_FALLBACK: &str = "h2";
const PRICE: &str = "span.a-price-whole";
const RATING: &str = "span.a-icon-alt";
const LINK: &str = "h2 a[href]";
const LINK_FALLBACK: &str = "a.a-link-normal[href]";
const IMAGE: &str = "img.s-image[src]";

struct ResultSelectors {
    item: Selector,
    name: Selector,
    name_fallback: Selector,
    price: Selector,
    rating: Selector,
    link: Selector,
    link_fallback: Selector,
    image: Selector,
}

impl ResultSelectors {
    fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            item: selector(RESULT_ITEM)?,
            name: selector(NAME)?,
            name_fallback: selector(NAME_FALLBACK)?,
            price: selector(PRICE)?,
            rating: selector(RATING)?,
            link: selector(LINK)?,
            link_fallback: selector(LINK_FALLBACK)?,
            image: selector(IMAGE)?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("selector {css}: {e}")))
}

/// Extract every result item that has both a name and a price.
///
/// Relative product links are resolved against `base_url`. A page without
/// result items yields an empty list.
pub fn extract_products(html: &str, base_url: &Url) -> Result<Vec<ProductRecord>, ScrapeError> {
    let sel = ResultSelectors::new()?;
    let document = Html::parse_document(html);

    let mut out = Vec::new();
    for item in document.select(&sel.item) {
        let name = first_text(&item, &sel.name).or_else(|| first_text(&item, &sel.name_fallback));
        let price = first_text(&item, &sel.price).map(|p| normalize_price(&p));
        let (Some(name), Some(price)) = (name, price) else {
            continue;
        };
        if price.is_empty() {
            continue;
        }
        let rating = first_text(&item, &sel.rating);
        let link = first_attr(&item, &sel.link, "href")
            .or_else(|| first_attr(&item, &sel.link_fallback, "href"))
            .and_then(|href| base_url.join(&href).ok())
            .map(|u| u.to_string());
        let image = first_attr(&item, &sel.image, "src");
        out.push(ProductRecord {
            name,
            price,
            rating,
            link,
            image,
        });
    }
    Ok(out)
}

fn first_text(scope: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

fn first_attr(scope: &ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    scope
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `"45,990."` -> `"45990"`.
fn normalize_price(raw: &str) -> String {
    raw.replace(',', "").trim().trim_end_matches('.').to_string()
}
