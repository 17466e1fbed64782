//! The closed set of categories, built once per run and shared by reference.

use crate::model::CategoryDef;

pub const OTHER: &str = "other";
pub const REJECTED: &str = "rejected";
pub const HALL_OF_FAME: &str = "hall_of_fame";
pub const ARTEFACTS: &str = "artefacts";

#[derive(Debug, Clone)]
pub struct Catalog {
    /// Categories the classifier may assign, in display order.
    categories: Vec<CategoryDef>,
    hall_of_fame: CategoryDef,
    artefacts: CategoryDef,
}

impl Catalog {
    pub fn default_scraping() -> Self {
        Catalog {
            categories: vec![
                CategoryDef {
                    id: "full_featured_frameworks",
                    name: "Full-Featured Frameworks",
                    description: "All-in-one solutions designed to handle crawling (visiting many pages) and scraping (extracting data) at scale.",
                    examples: &["Scrapy", "Crawlee", "Firecrawl", "Crawl4AI"],
                    best_for: "Large projects requiring structured data and managed workflows.",
                },
                CategoryDef {
                    id: "browser_automation",
                    name: "Browser Automation",
                    description: "Tools that control real web browsers (Chrome, Firefox, WebKit). Essential for websites that require JavaScript to render.",
                    examples: &["Puppeteer", "Playwright", "SeleniumBase", "Zendriver"],
                    best_for: "High-interactivity sites, SPAs (Single Page Apps), and bypassing simple bot detection.",
                },
                CategoryDef {
                    id: "ai_llm_scrapers",
                    name: "AI & LLM-Powered Scrapers",
                    description: "The 'new wave' of scrapers that use Large Language Models to understand page structure and extract data using natural language.",
                    examples: &["Scrapegraph-ai", "CyberScraper-2077", "HyperAgent"],
                    best_for: "Unstructured sites or when you don't want to write manual CSS/XPath selectors.",
                },
                CategoryDef {
                    id: "http_clients",
                    name: "HTTP Clients & Request Libraries",
                    description: "Lightweight tools used to fetch the raw HTML/data of a page without the overhead of a full browser.",
                    examples: &["Axios", "Httpx", "Got", "Urllib3", "Curl_cffi"],
                    best_for: "Speed, performance, and simple APIs.",
                },
                CategoryDef {
                    id: "parsers_extractors",
                    name: "Parsers & Extractors",
                    description: "Tools that take raw HTML or XML and turn it into a format your code can read (like JSON).",
                    examples: &["Cheerio", "BeautifulSoup (via lxml)", "Selectolax", "Htmlparser2"],
                    best_for: "Selecting specific elements once you already have the page source.",
                },
                CategoryDef {
                    id: "evasion_fingerprinting",
                    name: "Evasion & Fingerprinting",
                    description: "Libraries specifically designed to help scrapers look like real users and avoid being blocked.",
                    examples: &["Cloudscraper", "Camoufox", "Proxy-chain", "Fake-useragent"],
                    best_for: "Bypassing Cloudflare, Akamai, or other anti-bot services.",
                },
                CategoryDef {
                    id: "data_cleaning",
                    name: "Data Cleaning & Sanitization",
                    description: "Tools to clean up the 'messy' data you've extracted, such as stripping HTML tags or converting dates.",
                    examples: &["Bleach", "Js-xss", "Dateparser", "Price-parser", "Python-slugify"],
                    best_for: "Post-processing data before saving it to a database.",
                },
                CategoryDef {
                    id: OTHER,
                    name: "Other",
                    description: "Tools and libraries related to web scraping that don't fit neatly into other categories.",
                    examples: &[],
                    best_for: "Miscellaneous scraping-related utilities and tools.",
                },
                CategoryDef {
                    id: REJECTED,
                    name: "Rejected",
                    description: "Repositories that are NOT related to web scraping, crawling, or data extraction. This includes general-purpose libraries, unrelated tools, or repos that were miscategorized.",
                    examples: &[],
                    best_for: "Filtering out irrelevant repositories.",
                },
            ],
            hall_of_fame: CategoryDef {
                id: HALL_OF_FAME,
                name: "Hall of Fame",
                description: "Established projects that have not shipped a release recently.",
                examples: &[],
                best_for: "",
            },
            artefacts: CategoryDef {
                id: ARTEFACTS,
                name: "Artefacts",
                description: "Projects that have gone the longest without a release.",
                examples: &[],
                best_for: "",
            },
        }
    }

    pub fn categories(&self) -> &[CategoryDef] {
        &self.categories
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.categories.iter().map(|c| c.id).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    pub fn hall_of_fame(&self) -> &CategoryDef {
        &self.hall_of_fame
    }

    pub fn artefacts(&self) -> &CategoryDef {
        &self.artefacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallbacks_are_part_of_the_closed_set() {
        let catalog = Catalog::default_scraping();
        assert!(catalog.contains(OTHER));
        assert!(catalog.contains(REJECTED));
        assert!(!catalog.contains(HALL_OF_FAME));
        assert!(!catalog.contains("web_scrapers"));
        assert_eq!(catalog.ids().len(), 9);
        assert_eq!(catalog.ids().last(), Some(&REJECTED));
    }

    #[test]
    fn aging_text_does_not_name_a_window() {
        // windows come from settings
        let catalog = Catalog::default_scraping();
        for def in [catalog.hall_of_fame(), catalog.artefacts()] {
            let text = def.description.to_lowercase();
            assert!(!text.chars().any(|c| c.is_ascii_digit()), "{}", text);
            for unit in ["month", "year", "six", "twelve"] {
                assert!(!text.contains(unit), "{}", text);
            }
        }
    }
}
