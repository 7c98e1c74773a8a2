//! Stahování surových payloadů kanceláří
//!
//! efortuna renderuje nabídku v JS → headless Chrome, z DOM se drží jen
//! `#main-content`. betclick a lvbet mají JSON API → reqwest.

use anyhow::{anyhow, Context, Result};
use bet_model::{Category, Provider, RawContent};
use headless_chrome::{Browser, LaunchOptions};
use logger::{now_iso, EventLogger, RawContentFetchedEvent};
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::task;
use tracing::{info, warn};

use crate::bet_db::SqliteRawContentStore;

const MAIN_CONTENT_SELECTOR: &str = "#main-content";

/// Výpisy zápasů pro kombinaci kancelář × kategorie
pub fn urls_for(provider: Provider, category: Category) -> Vec<&'static str> {
    match (provider, category) {
        (Provider::Efortuna, Category::Esport) => vec![
            "https://www.efortuna.pl/zaklady-bukmacherskie/esport-cs-go?selectDates=1",
            "https://www.efortuna.pl/zaklady-bukmacherskie/esport-lol?selectDates=1",
            "https://www.efortuna.pl/zaklady-bukmacherskie/esport-dota2?selectDates=1",
            "https://www.efortuna.pl/zaklady-bukmacherskie/esport-starcraft-2?selectDates=1",
            "https://www.efortuna.pl/zaklady-bukmacherskie/esport-rainbow-six?selectDates=1",
            "https://www.efortuna.pl/zaklady-bukmacherskie/esport-pozosta%C5%82e?selectDates=1",
        ],
        (Provider::Betclick, Category::Esport) => vec![
            "https://offer.cdn.begmedia.com/api/pub/v4/events?application=2048&countrycode=pl&fetchMultipleDefaultMarkets=true&language=pa&limit=1000&offset=0&sitecode=plpa&sortBy=ByLiveRankingPreliveDate&sportIds=102",
        ],
        (Provider::Lvbet, Category::Esport) => vec![
            "https://app.lvbet.pl/_api/v1/offer/matches/?is_live=false&sports_groups_ids=41071,42981,43200,43415,44564,45586,45649,43555,43910,45644,45647,9870,9964,41592,44058,1168,45642,5878,2806,45595,45609,45619,45670&lang=pl",
        ],
    }
}

/// Odkud se berou payloady — v testech se podstrčí statický zdroj
pub trait PayloadFetcher {
    async fn fetch(&self, provider: Provider, urls: &[&str]) -> Result<String>;
}

pub struct WebClient {
    http:    reqwest::Client,
    timeout: Duration,
}

impl WebClient {
    /// Timeout je z konfigurace — klient bez něj se nestaví
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36")
            .timeout(timeout)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, timeout })
    }

    async fn fetch_http(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request failed for {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {} for {}", status, url));
        }

        Ok(resp.text().await?)
    }

    async fn fetch_rendered(&self, url: &str) -> Result<String> {
        let url = url.to_string();
        let timeout = self.timeout;

        let html = task::spawn_blocking(move || -> Result<String> {
            let options = LaunchOptions::default_builder()
                .headless(true)
                .sandbox(false)
                .build()
                .context("Failed to build Chrome launch options")?;

            let browser = Browser::new(options).context("Failed to launch Chrome")?;
            let tab = browser.new_tab().context("Failed to create browser tab")?;
            tab.set_default_timeout(timeout);

            tab.navigate_to(&url).context("Chrome navigate failed")?;
            tab.wait_for_element(MAIN_CONTENT_SELECTOR)
                .with_context(|| format!("{MAIN_CONTENT_SELECTOR} did not render on {url}"))?;

            tab.get_content().context("Failed to read HTML from browser tab")
        })
        .await??;

        extract_main_content(&html)
    }
}

impl PayloadFetcher for WebClient {
    async fn fetch(&self, provider: Provider, urls: &[&str]) -> Result<String> {
        let mut all_data = String::new();

        for url in urls {
            let content = match provider {
                Provider::Efortuna => self.fetch_rendered(url).await?,
                Provider::Betclick | Provider::Lvbet => self.fetch_http(url).await?,
            };
            all_data.push_str(&content);
        }

        Ok(all_data)
    }
}

/// Vyřízne `#main-content` — zbytek stránky je menu a skripty
pub fn extract_main_content(page: &str) -> Result<String> {
    let selector = Selector::parse(MAIN_CONTENT_SELECTOR)
        .map_err(|e| anyhow!("invalid selector {MAIN_CONTENT_SELECTOR}: {e:?}"))?;
    let document = Html::parse_document(page);

    document
        .select(&selector)
        .next()
        .map(|el| el.html())
        .ok_or_else(|| anyhow!("{MAIN_CONTENT_SELECTOR} not found in page"))
}

/// Stáhne všechny kombinace kancelář × kategorie. Selhání jedné kanceláře
/// se zaloguje a pokračuje se dál. Vrací počet uložených payloadů.
pub async fn import_raw_contents<F: PayloadFetcher>(
    fetcher: &F,
    store: &mut SqliteRawContentStore<'_>,
    journal: &EventLogger,
) -> Result<usize> {
    info!("Raw content importer has started");

    let mut stored = 0;
    for provider in Provider::ALL {
        for category in Category::ALL {
            let urls = urls_for(provider, category);
            info!(provider = %provider, category = %category, urls = urls.len(), "Importing raw content");

            let (ok, bytes, message) = match fetcher.fetch(provider, &urls).await {
                Ok(content) => {
                    let bytes = content.len();
                    store.create(&RawContent::new(content, category, provider))?;
                    stored += 1;
                    (true, bytes, "stored".to_string())
                }
                Err(e) => {
                    warn!(provider = %provider, category = %category, "raw content fetch failed: {:#}", e);
                    (false, 0, format!("{e:#}"))
                }
            };

            let ev = RawContentFetchedEvent {
                ts:       now_iso(),
                event:    "RAW_CONTENT_FETCHED",
                provider: provider.to_string(),
                category: category.to_string(),
                urls:     urls.len(),
                bytes,
                ok,
                message,
            };
            if let Err(e) = journal.log(&ev) {
                warn!("journal write failed: {}", e);
            }
        }
    }

    info!(stored, "Raw content importer finished");
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bet_db::init_schema;
    use bet_model::RawContentSource;
    use rusqlite::Connection;

    struct StaticFetcher;

    impl PayloadFetcher for StaticFetcher {
        async fn fetch(&self, provider: Provider, urls: &[&str]) -> Result<String> {
            match provider {
                Provider::Betclick => Err(anyhow!("HTTP 503 for {}", urls[0])),
                _ => Ok(format!("[] <!-- {} urls -->", urls.len())),
            }
        }
    }

    #[test]
    fn every_provider_has_listing_urls() {
        for provider in Provider::ALL {
            for category in Category::ALL {
                let urls = urls_for(provider, category);
                assert!(!urls.is_empty());
                assert!(urls.iter().all(|u| u.starts_with("https://")));
            }
        }
        assert_eq!(urls_for(Provider::Efortuna, Category::Esport).len(), 6);
    }

    #[test]
    fn keeps_only_main_content() {
        let page = r#"<html><body><nav>menu</nav>
            <div id="main-content"><table><tbody><tr><td>A - B</td></tr></tbody></table></div>
            <script>track()</script></body></html>"#;

        let main = extract_main_content(page).unwrap();

        assert!(main.starts_with("<div id=\"main-content\">"));
        assert!(main.contains("A - B"));
        assert!(!main.contains("menu"));
        assert!(!main.contains("track()"));
        assert!(extract_main_content("<html><body></body></html>").is_err());
    }

    #[test]
    fn web_client_keeps_configured_timeout() {
        let client = WebClient::new(Duration::from_secs(7)).unwrap();
        assert_eq!(client.timeout, Duration::from_secs(7));
    }

    #[tokio::test]
    async fn failing_provider_does_not_stop_the_others() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let journal = EventLogger::new(dir.path());
        let mut store = SqliteRawContentStore::new(&conn);

        let stored = import_raw_contents(&StaticFetcher, &mut store, &journal).await.unwrap();

        assert_eq!(stored, 2);
        let pending = store.get_all_unprocessed().unwrap();
        let providers: Vec<Provider> = pending.iter().map(|r| r.provider).collect();
        assert!(providers.contains(&Provider::Efortuna));
        assert!(providers.contains(&Provider::Lvbet));
        assert!(!providers.contains(&Provider::Betclick));
    }
}
