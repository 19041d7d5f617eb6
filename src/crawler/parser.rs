//! Listing extraction from results-page markup
//!
//! A results page carries two listing containers:
//! - `section.new-vehicles`, optional (absent on most later pages)
//! - `section.search-results`, required, holding the used-vehicle ads
//!
//! Extraction is pure: the same markup always yields the same records.

use crate::vehicle::{NewVehicle, SpecEntry, UsedVehicle};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::warn;

/// Errors raised when a page does not have the expected structure
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Listing container '{0}' not found")]
    MissingContainer(&'static str),

    #[error("Listing {index} has no '{selector}' element")]
    MissingElement {
        selector: &'static str,
        index: usize,
    },

    #[error("Invalid selector '{selector}': {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },
}

/// Listings extracted from one page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub new_vehicles: Vec<NewVehicle>,
    pub used_vehicles: Vec<UsedVehicle>,
}

/// A compiled selector that remembers its source for error messages
#[derive(Debug)]
struct Css {
    selector: Selector,
    source: &'static str,
}

impl Css {
    fn compile(source: &'static str) -> Result<Self, ExtractError> {
        let selector = Selector::parse(source).map_err(|e| ExtractError::Selector {
            selector: source,
            message: e.to_string(),
        })?;
        Ok(Self { selector, source })
    }
}

/// Extracts vehicle listings from results pages
///
/// Selectors are compiled once in [`ListingParser::new`] and reused for
/// every page.
#[derive(Debug)]
pub struct ListingParser {
    // New vehicles
    new_section: Css,
    new_vehicle: Css,
    new_image: Css,
    new_title: Css,
    new_model_year: Css,
    new_price: Css,
    new_specs: Css,

    // Used vehicles
    used_section: Css,
    used_offer: Css,
    used_title: Css,
    used_year: Css,
    used_price: Css,
    used_specs: Css,

    // Shared
    link: Css,
    image: Css,
    item_name: Css,
    item_model: Css,
    item_id: Css,
    item_manufacturer: Css,
    spec_name: Css,
    spec_value: Css,
}

impl ListingParser {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            new_section: Css::compile("section.new-vehicles")?,
            new_vehicle: Css::compile("div.new-vehicle")?,
            new_image: Css::compile("div.new-vehicle-img img")?,
            new_title: Css::compile("h2.new-vehicle-heading-title")?,
            new_model_year: Css::compile("span.new-vehicle-model")?,
            new_price: Css::compile("div.new-vehicle-price")?,
            new_specs: Css::compile("table.specs-table")?,

            used_section: Css::compile("section.search-results")?,
            used_offer: Css::compile(r#"div[itemtype="http://schema.org/Offer"]"#)?,
            used_title: Css::compile("h2.car-ad-name")?,
            used_year: Css::compile("h3.car-ad-year")?,
            used_price: Css::compile("div.car-ad-price")?,
            used_specs: Css::compile("table.used-specs-table")?,

            link: Css::compile("a")?,
            image: Css::compile("img")?,
            item_name: Css::compile(r#"span[itemprop="name"]"#)?,
            item_model: Css::compile(r#"span[itemprop="model"]"#)?,
            item_id: Css::compile(r#"span[itemprop="productID"]"#)?,
            item_manufacturer: Css::compile(r#"span[itemprop="manufacturer"]"#)?,
            spec_name: Css::compile("th")?,
            spec_value: Css::compile("td")?,
        })
    }

    /// Parses a page once and extracts both listing kinds
    pub fn parse_page(&self, html: &str) -> Result<ParsedPage, ExtractError> {
        let document = Html::parse_document(html);
        Ok(ParsedPage {
            new_vehicles: self.new_vehicles_in(&document)?,
            used_vehicles: self.used_vehicles_in(&document)?,
        })
    }

    /// Extracts the new-vehicle listings of a page
    ///
    /// A page without a new-vehicles section yields an empty list.
    pub fn extract_new(&self, html: &str) -> Result<Vec<NewVehicle>, ExtractError> {
        self.new_vehicles_in(&Html::parse_document(html))
    }

    /// Extracts the used-vehicle listings of a page
    ///
    /// Fails with [`ExtractError::MissingContainer`] when the search results
    /// section is absent.
    pub fn extract_used(&self, html: &str) -> Result<Vec<UsedVehicle>, ExtractError> {
        self.used_vehicles_in(&Html::parse_document(html))
    }

    fn new_vehicles_in(&self, document: &Html) -> Result<Vec<NewVehicle>, ExtractError> {
        let Some(section) = document.select(&self.new_section.selector).next() else {
            return Ok(Vec::new());
        };

        section
            .select(&self.new_vehicle.selector)
            .enumerate()
            .map(|(index, listing)| self.new_vehicle_from(listing, index))
            .collect()
    }

    fn new_vehicle_from(
        &self,
        listing: ElementRef<'_>,
        index: usize,
    ) -> Result<NewVehicle, ExtractError> {
        Ok(NewVehicle {
            image: first_attr(listing, &self.new_image, "data-original"),
            detail_link: first_attr(listing, &self.link, "href"),
            name: required_text(listing, &self.item_name, index)?,
            model: required_text(listing, &self.item_model, index)?,
            id: required_text(listing, &self.item_id, index)?,
            manufacturer: required_text(listing, &self.item_manufacturer, index)?,
            title: required_text(listing, &self.new_title, index)?,
            model_year: required_text(listing, &self.new_model_year, index)?,
            price: required_text(listing, &self.new_price, index)?,
            specs: self.extract_specs(first(listing, &self.new_specs)),
        })
    }

    fn used_vehicles_in(&self, document: &Html) -> Result<Vec<UsedVehicle>, ExtractError> {
        let section = document
            .select(&self.used_section.selector)
            .next()
            .ok_or(ExtractError::MissingContainer(self.used_section.source))?;

        section
            .select(&self.used_offer.selector)
            .enumerate()
            .map(|(index, listing)| self.used_vehicle_from(listing, index))
            .collect()
    }

    fn used_vehicle_from(
        &self,
        listing: ElementRef<'_>,
        index: usize,
    ) -> Result<UsedVehicle, ExtractError> {
        let link = first(listing, &self.link);

        // The link's vehicle id wins over the microdata one
        let id = link
            .and_then(|a| a.value().attr("data-idvehiculo"))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| optional_text(listing, &self.item_id));

        Ok(UsedVehicle {
            whatsapp_user_id: String::new(),
            image: first_attr(listing, &self.image, "data-original"),
            detail_link: link
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string(),
            name: optional_text(listing, &self.item_name),
            model: optional_text(listing, &self.item_model),
            id,
            manufacturer: optional_text(listing, &self.item_manufacturer),
            title: required_text(listing, &self.used_title, index)?,
            ad_year: required_text(listing, &self.used_year, index)?,
            ad_price: required_text(listing, &self.used_price, index)?,
            specs: self.extract_specs(first(listing, &self.used_specs)),
        })
    }

    /// Pairs a spec table's header cells with its value cells by position
    ///
    /// A missing table, or a table whose header and value counts differ,
    /// yields an empty list and a warning.
    pub fn extract_specs(&self, table: Option<ElementRef<'_>>) -> Vec<SpecEntry> {
        let Some(table) = table else {
            warn!("No specs found");
            return Vec::new();
        };

        let names: Vec<String> = table.select(&self.spec_name.selector).map(text_of).collect();
        let values: Vec<String> = table
            .select(&self.spec_value.selector)
            .map(text_of)
            .collect();

        if names.len() != values.len() {
            warn!(
                headers = names.len(),
                values = values.len(),
                "Differences found in specs: {:?} - {:?}",
                names,
                values
            );
            return Vec::new();
        }

        names
            .into_iter()
            .zip(values)
            .map(|(name, value)| SpecEntry { name, value })
            .collect()
    }
}

/// Convenience function that parses a page with a freshly built parser
///
/// # Example
///
/// ```no_run
/// use carroya_scraper::crawler::parse_page;
///
/// let html = r#"<section class="search-results"></section>"#;
/// let page = parse_page(html).unwrap();
/// assert!(page.used_vehicles.is_empty());
/// ```
pub fn parse_page(html: &str) -> Result<ParsedPage, ExtractError> {
    ListingParser::new()?.parse_page(html)
}

/// Concatenated descendant text, trimmed
fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first<'a>(scope: ElementRef<'a>, css: &Css) -> Option<ElementRef<'a>> {
    scope.select(&css.selector).next()
}

fn first_attr(scope: ElementRef<'_>, css: &Css, attr: &str) -> String {
    first(scope, css)
        .and_then(|element| element.value().attr(attr))
        .unwrap_or_default()
        .to_string()
}

fn optional_text(scope: ElementRef<'_>, css: &Css) -> String {
    first(scope, css).map(text_of).unwrap_or_default()
}

fn required_text(scope: ElementRef<'_>, css: &Css, index: usize) -> Result<String, ExtractError> {
    first(scope, css)
        .map(text_of)
        .ok_or(ExtractError::MissingElement {
            selector: css.source,
            index,
        })
}
