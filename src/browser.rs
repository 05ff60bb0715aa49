use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Selector};
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;
use tracing::debug;

use crate::config::BrowserConfig;

/// How a single element is found on a rendered registry page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// First element carrying the attribute, whatever its value.
    Marker(&'static str),
    /// First `tag` element whose class attribute contains every string in
    /// `all` and at least one in `any`, as substrings (`md:text-sm` counts).
    Classes {
        tag: &'static str,
        all: &'static [&'static str],
        any: &'static [&'static str],
    },
    /// First `value` sibling following a `term` element whose text is exactly `label`.
    AfterLabel {
        term: &'static str,
        label: &'static str,
        value: &'static str,
    },
    /// Inner `div > div` of the generated button with this id.
    Control(&'static str),
}

impl Locator {
    /// CSS form, when the lookup can be expressed as a selector.
    pub fn css(&self) -> Option<String> {
        match self {
            Locator::Marker(attr) => Some(format!("[{attr}]")),
            Locator::Control(id) => Some(format!("button[id='{id}'] > div > div")),
            Locator::Classes { .. } | Locator::AfterLabel { .. } => None,
        }
    }

    pub fn xpath(&self) -> String {
        match self {
            Locator::Marker(attr) => format!("//*[@{attr}]"),
            Locator::Classes { tag, all, any } => {
                let all: Vec<String> = all
                    .iter()
                    .map(|c| format!("contains(@class, '{c}')"))
                    .collect();
                let any: Vec<String> = any
                    .iter()
                    .map(|c| format!("contains(@class, '{c}')"))
                    .collect();
                format!("//{tag}[{} and ({})]", all.join(" and "), any.join(" or "))
            }
            Locator::AfterLabel { term, label, value } => {
                format!("//{term}[text()='{label}']/following-sibling::{value}[1]")
            }
            Locator::Control(id) => format!("//button[@id='{id}']/div/div"),
        }
    }

    fn to_by(self) -> By {
        match self.css() {
            Some(css) => By::Css(css),
            None => By::XPath(self.xpath()),
        }
    }
}

/// The four operations the extractors need from a rendering surface.
#[allow(async_fn_in_trait)]
pub trait PageBackend {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Blocks until `locator` is visible; errors once `timeout` has elapsed.
    async fn wait_until_visible(&mut self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Raw text of the first match, or `None` when nothing matches.
    async fn find_text(&mut self, locator: &Locator) -> Result<Option<String>>;

    async fn page_source(&mut self) -> Result<String>;
}

// ── Live browser ──

/// A WebDriver-controlled Chrome session, reused for every identifier of a run.
pub struct WebDriverSession {
    driver: WebDriver,
    poll_interval: Duration,
}

impl WebDriverSession {
    pub async fn start(config: &BrowserConfig) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--window-size=1920,1080")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--log-level=3")?;

        let driver = WebDriver::new(config.webdriver_url.as_str(), caps)
            .await
            .with_context(|| format!("Failed to start browser session at {}", config.webdriver_url))?;

        Ok(WebDriverSession {
            driver,
            poll_interval: config.poll_interval,
        })
    }

    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await.context("Failed to close browser session")
    }
}

impl PageBackend for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn wait_until_visible(&mut self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.driver
            .query(locator.to_by())
            .wait(timeout, self.poll_interval)
            .and_displayed()
            .first()
            .await?;
        Ok(())
    }

    async fn find_text(&mut self, locator: &Locator) -> Result<Option<String>> {
        let elements = self.driver.find_all(locator.to_by()).await?;
        match elements.first() {
            Some(el) => Ok(Some(el.text().await?)),
            None => Ok(None),
        }
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.driver.source().await?)
    }
}

// ── Static snapshots ──

/// Saved page markup served in place of a live browser. Every element in the
/// markup counts as visible, so readiness is decided by presence alone.
#[derive(Debug, Default)]
pub struct Snapshot {
    pages: HashMap<String, String>,
    fallback: Option<String>,
    current: Option<String>,
}

impl Snapshot {
    /// Serve the same markup for every URL.
    pub fn single(html: impl Into<String>) -> Self {
        Snapshot {
            fallback: Some(html.into()),
            ..Default::default()
        }
    }

    /// Serve markup per URL; unknown URLs fail to navigate.
    pub fn from_pages(pages: HashMap<String, String>) -> Self {
        Snapshot {
            pages,
            ..Default::default()
        }
    }

    fn document(&self) -> Result<Html> {
        let html = self
            .current
            .as_deref()
            .ok_or_else(|| anyhow!("No page loaded"))?;
        Ok(Html::parse_document(html))
    }
}

impl PageBackend for Snapshot {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let html = self
            .pages
            .get(url)
            .or(self.fallback.as_ref())
            .ok_or_else(|| anyhow!("No snapshot for {}", url))?;
        self.current = Some(html.clone());
        Ok(())
    }

    async fn wait_until_visible(&mut self, locator: &Locator, timeout: Duration) -> Result<()> {
        let document = self.document()?;
        match select_first(&document, locator)? {
            Some(_) => Ok(()),
            None => Err(anyhow!(
                "{} not present after {:.1}s",
                locator.xpath(),
                timeout.as_secs_f64()
            )),
        }
    }

    async fn find_text(&mut self, locator: &Locator) -> Result<Option<String>> {
        let document = self.document()?;
        Ok(select_first(&document, locator)?.map(element_text))
    }

    async fn page_source(&mut self) -> Result<String> {
        self.current.clone().ok_or_else(|| anyhow!("No page loaded"))
    }
}

fn select_first<'a>(document: &'a Html, locator: &Locator) -> Result<Option<ElementRef<'a>>> {
    if let Some(css) = locator.css() {
        let selector =
            Selector::parse(&css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))?;
        return Ok(document.select(&selector).next());
    }

    if let Locator::Classes { tag, all, any } = *locator {
        let tags = Selector::parse(tag).map_err(|e| anyhow!("Invalid selector {}: {:?}", tag, e))?;
        return Ok(document.select(&tags).find(|el| {
            let class = el.value().attr("class").unwrap_or("");
            all.iter().all(|c| class.contains(c)) && any.iter().any(|c| class.contains(c))
        }));
    }

    let Locator::AfterLabel { term, label, value } = *locator else {
        return Ok(None);
    };
    let terms = Selector::parse(term).map_err(|e| anyhow!("Invalid selector {}: {:?}", term, e))?;
    let found = document
        .select(&terms)
        .find(|el| {
            el.children()
                .filter_map(|n| n.value().as_text())
                .any(|t| &**t == label)
        })
        .and_then(|el| {
            el.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sib| sib.value().name() == value)
        });
    if found.is_none() {
        debug!("No {} after label {:?}", value, label);
    }
    Ok(found)
}

/// Rendered-text approximation: text nodes joined by single spaces.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
