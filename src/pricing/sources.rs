//! Live market sources for the gold price and the USD/INR rate.
//!
//! Sources only fetch and parse; caching, timeouts and fallbacks belong to
//! [`LiveMarketFeed`](super::feed::LiveMarketFeed).

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, Result};

use super::calculators::round_money;

/// Client-level ceiling; the feed applies its own, shorter bound per call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (compatible; jewelry-pricing/0.1)";

fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// A single live market value
#[async_trait]
pub trait LiveQuoteSource: Send + Sync {
    fn id(&self) -> &'static str;

    async fn fetch(&self) -> Result<Decimal>;
}

/// Pull the price out of display text such as `"24K Gold: ₹ 98,450.00 / 10g"`.
///
/// Numbers followed by a karat label (`24K`, `22 kt`) are skipped and the
/// largest remaining number wins, so unit hints like `/ 10g` lose to the
/// price. Thousands separators are dropped.
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let mut best: Option<Decimal> = None;
    let mut rest = text;

    while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
        let tail = &rest[start..];
        let end = tail
            .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
            .unwrap_or(tail.len());
        let (run, after) = tail.split_at(end);
        rest = after;

        if is_karat_label(after) {
            continue;
        }
        let digits: String = run
            .trim_end_matches(|c| c == '.' || c == ',')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        if let Ok(value) = Decimal::from_str(&digits) {
            best = Some(best.map_or(value, |b| b.max(value)));
        }
    }

    best
}

fn is_karat_label(after: &str) -> bool {
    after
        .trim_start()
        .chars()
        .next()
        .map_or(false, |c| c.eq_ignore_ascii_case(&'k'))
}

/// Text of the first element matching `selector`, parsed as a price.
pub fn extract_price(html: &str, selector: &str) -> Result<Decimal> {
    let selector = Selector::parse(selector)
        .map_err(|e| AppError::Config(format!("invalid gold price selector: {}", e)))?;
    let document = Html::parse_document(html);
    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| AppError::feed(GOLD_SOURCE_ID, "selector matched nothing"))?;
    let text: String = element.text().collect();
    parse_price_text(&text)
        .ok_or_else(|| AppError::feed(GOLD_SOURCE_ID, format!("no price in {:?}", text.trim())))
}

const GOLD_SOURCE_ID: &str = "gold_html";

/// 24K gold price scraped from a public rate page.
///
/// Rate pages usually quote per 10 grams; `grams_per_quote` normalizes the
/// scraped figure to INR per gram.
pub struct HtmlGoldPriceSource {
    client: Client,
    url: String,
    selector: String,
    grams_per_quote: Decimal,
}

impl HtmlGoldPriceSource {
    pub fn new(url: String, selector: String, grams_per_quote: Decimal) -> Result<Self> {
        Selector::parse(&selector)
            .map_err(|e| AppError::Config(format!("invalid gold price selector: {}", e)))?;
        if grams_per_quote <= Decimal::ZERO {
            return Err(AppError::Config(
                "gold price grams per quote must be positive".to_string(),
            ));
        }

        Ok(Self {
            client: http_client(),
            url,
            selector,
            grams_per_quote,
        })
    }

    /// Per-gram price from a scraped page body
    pub fn price_from_page(&self, html: &str) -> Result<Decimal> {
        let quoted = extract_price(html, &self.selector)?;
        let per_gram = quoted.checked_div(self.grams_per_quote).ok_or_else(|| {
            AppError::feed(
                GOLD_SOURCE_ID,
                format!("{} per {} g overflowed", quoted, self.grams_per_quote),
            )
        })?;
        Ok(round_money(per_gram, 2))
    }
}

#[async_trait]
impl LiveQuoteSource for HtmlGoldPriceSource {
    fn id(&self) -> &'static str {
        GOLD_SOURCE_ID
    }

    async fn fetch(&self) -> Result<Decimal> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::feed(
                GOLD_SOURCE_ID,
                format!("request failed: {}", response.status()),
            ));
        }

        // Html is not Send; parse only after the last await.
        let body = response.text().await?;
        let price = self.price_from_page(&body)?;
        debug!("Scraped gold price {} INR/g from {}", price, self.url);
        Ok(price)
    }
}

const FX_SOURCE_ID: &str = "fx_json";

/// `{ "rates": { "INR": 83.12, ... } }` with USD as base
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// USD to INR exchange rate from a JSON rates endpoint
pub struct JsonExchangeRateSource {
    client: Client,
    url: String,
    currency: String,
}

impl JsonExchangeRateSource {
    pub fn new(url: String) -> Self {
        Self {
            client: http_client(),
            url,
            currency: "INR".to_string(),
        }
    }

    /// Rate for the target currency from a response body
    pub fn rate_from_body(&self, body: &str) -> Result<Decimal> {
        let parsed: RatesResponse = serde_json::from_str(body)?;
        let rate = parsed.rates.get(&self.currency).copied().ok_or_else(|| {
            AppError::feed(FX_SOURCE_ID, format!("no {} rate in response", self.currency))
        })?;
        let rate = Decimal::try_from(rate)
            .map_err(|e| AppError::feed(FX_SOURCE_ID, format!("invalid rate {}: {}", rate, e)))?;
        Ok(round_money(rate, 4))
    }
}

#[async_trait]
impl LiveQuoteSource for JsonExchangeRateSource {
    fn id(&self) -> &'static str {
        FX_SOURCE_ID
    }

    async fn fetch(&self) -> Result<Decimal> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::feed(
                FX_SOURCE_ID,
                format!("request failed: {}", response.status()),
            ));
        }
        let body = response.text().await?;
        self.rate_from_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_price_text() {
        assert_eq!(parse_price_text("₹ 98,450.00 / 10g"), Some(dec!(98450.00)));
        assert_eq!(parse_price_text("Rs. 9,845"), Some(dec!(9845)));
        assert_eq!(parse_price_text("  72150 "), Some(dec!(72150)));
        assert_eq!(parse_price_text("1,00,250."), Some(dec!(100250)));
        assert_eq!(parse_price_text("price unavailable"), None);
        assert_eq!(parse_price_text(""), None);
    }

    #[test]
    fn test_parse_price_text_skips_karat_labels() {
        assert_eq!(parse_price_text("24K Gold: ₹ 98,450 / 10g"), Some(dec!(98450)));
        assert_eq!(parse_price_text("22 kt ₹90,100"), Some(dec!(90100)));
        assert_eq!(parse_price_text("18Karat 10 gram: Rs 73,800"), Some(dec!(73800)));
        assert_eq!(parse_price_text("24K"), None);
    }

    #[test]
    fn test_extract_price_from_html() {
        let html = r#"
            <html><body>
              <table>
                <tr><td>22K</td><td class="rate">₹ 90,100</td></tr>
              </table>
              <div id="gold-24k"><span class="rate">₹ 98,300</span></div>
            </body></html>
        "#;
        assert_eq!(extract_price(html, "#gold-24k .rate").unwrap(), dec!(98300));
        assert_eq!(extract_price(html, "td.rate").unwrap(), dec!(90100));
    }

    #[test]
    fn test_extract_price_errors() {
        let html = "<div class='rate'>call for price</div>";
        assert!(matches!(
            extract_price(html, ".missing"),
            Err(AppError::Feed { .. })
        ));
        assert!(matches!(extract_price(html, ".rate"), Err(AppError::Feed { .. })));
        assert!(matches!(extract_price(html, "[["), Err(AppError::Config(_))));
    }

    #[test]
    fn test_html_source_normalizes_per_gram() {
        let source = HtmlGoldPriceSource::new(
            "http://localhost/gold".to_string(),
            ".rate".to_string(),
            dec!(10),
        )
        .unwrap();
        let price = source
            .price_from_page("<p class='rate'>₹98,455</p>")
            .unwrap();
        assert_eq!(price, dec!(9845.50));
    }

    #[test]
    fn test_html_source_with_karat_label_in_text() {
        let source = HtmlGoldPriceSource::new(
            "http://localhost/gold".to_string(),
            ".rate".to_string(),
            dec!(10),
        )
        .unwrap();
        let price = source
            .price_from_page("<p class='rate'>24K Gold: ₹ 98,450 / 10g</p>")
            .unwrap();
        assert_eq!(price, dec!(9845));
    }

    #[test]
    fn test_html_source_overflow_is_feed_error() {
        let source = HtmlGoldPriceSource::new(
            "http://localhost/gold".to_string(),
            ".rate".to_string(),
            dec!(0.5),
        )
        .unwrap();
        let result = source.price_from_page(&format!("<p class='rate'>{}</p>", Decimal::MAX));
        assert!(matches!(result, Err(AppError::Feed { .. })));
    }

    #[test]
    fn test_html_source_rejects_bad_config() {
        assert!(HtmlGoldPriceSource::new("u".to_string(), "[[".to_string(), dec!(10)).is_err());
        assert!(HtmlGoldPriceSource::new("u".to_string(), ".r".to_string(), dec!(0)).is_err());
    }

    #[test]
    fn test_rate_from_body() {
        let source = JsonExchangeRateSource::new("http://localhost/fx".to_string());
        let rate = source
            .rate_from_body(r#"{"base":"USD","rates":{"EUR":0.92,"INR":83.1234}}"#)
            .unwrap();
        assert_eq!(rate, dec!(83.1234));

        assert!(matches!(
            source.rate_from_body(r#"{"rates":{"EUR":0.92}}"#),
            Err(AppError::Feed { .. })
        ));
        assert!(matches!(source.rate_from_body("not json"), Err(AppError::Json(_))));
    }
}
