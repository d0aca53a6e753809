use crate::catalog::Instrument;
use crate::error::{Error, Result};
use crate::page_table::{RawRow, parse_daily_table};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://finance.naver.com/item/sise_day.nhn";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.96 Safari/537.36";

/// One trading day for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Rows with any missing field are not bars.
    pub fn from_raw(raw: &RawRow) -> Option<Self> {
        Some(Bar {
            date: raw.date?,
            open: raw.open?,
            high: raw.high?,
            low: raw.low?,
            close: raw.close?,
            volume: raw.volume?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FetchSettings {
    pub base_url: String, // e.g., "https://finance.naver.com/item/sise_day.nhn"
    pub pages: u32,       // pages per instrument, ~10 rows each
    pub page_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pages: 7,
            page_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A provider of paginated daily rows, addressed by instrument and 1-based
/// page index.
///
/// A page without a usable table must be reported as [`Error::MalformedPage`];
/// any other error aborts the instrument.
pub trait BarSource: Send + Sync {
    fn fetch_page(
        &self,
        instrument: &Instrument,
        page: u32,
    ) -> impl Future<Output = Result<Vec<RawRow>>> + Send;
}

/// Daily price pages served as HTML tables, one page per request.
pub struct NaverDailySource {
    client: Client,
    base_url: String,
}

impl NaverDailySource {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.page_timeout_secs))
            .pool_max_idle_per_host(50)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }
}

impl BarSource for NaverDailySource {
    async fn fetch_page(&self, instrument: &Instrument, page: u32) -> Result<Vec<RawRow>> {
        let failed = |e: reqwest::Error| Error::FetchFailed {
            instrument_id: instrument.id.clone(),
            cause: e.to_string(),
        };

        let page_str = page.to_string();
        let query = [("code", instrument.id.as_str()), ("page", page_str.as_str())];

        let body = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(failed)?
            .error_for_status()
            .map_err(failed)?
            .text()
            .await
            .map_err(failed)?;

        parse_daily_table(&body).ok_or_else(|| Error::MalformedPage {
            instrument_id: instrument.id.clone(),
            page,
        })
    }
}

/// Fetches pages `1..=pages` serially and concatenates their complete rows.
///
/// The result is in page order, not date order. Malformed pages are skipped;
/// the first other error is returned as is.
pub async fn fetch_series<S: BarSource>(
    source: &S,
    instrument: &Instrument,
    pages: u32,
) -> Result<Vec<Bar>> {
    let mut bars = Vec::new();

    for page in 1..=pages {
        match source.fetch_page(instrument, page).await {
            Ok(rows) => bars.extend(rows.iter().filter_map(Bar::from_raw)),
            Err(Error::MalformedPage { .. }) => {
                tracing::debug!(instrument = %instrument.id, page, "No table on page, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    if bars.is_empty() {
        return Err(Error::NoDataAvailable(instrument.id.clone()));
    }
    Ok(bars)
}
