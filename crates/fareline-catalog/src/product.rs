use std::collections::HashMap;

use serde::Serialize;
use url::Url;

const TEXT_COLOR: &str = "#000";
const BACKGROUND_COLOR: &str = "#A0C305";

/// Operator block of a response record: the provider's presentation plus the
/// rendered deeplink and store links.
#[derive(Debug, Clone, Serialize)]
pub struct Operator {
    pub branch_id: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub site: Option<Site>,
    pub background_color: String,
    pub short_title: Option<String>,
    pub store_urls: Option<StoreUrls>,
    pub id: Option<i32>,
    pub text_color: String,
    pub title: Option<String>,
    pub org_id: Option<String>,
    pub phone: Option<Phone>,
    pub is_optimal: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Site {
    pub value: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Phone {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreUrl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios: Option<StoreUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<StoreUrl>,
}

/// One catalog product: a provider's logical offering in one region, with the
/// tariff whitelist folded in from sibling rows.
#[derive(Debug, Clone, Default)]
pub struct Product {
    pub id: i32,
    pub region_id: i32,
    pub name: String,
    pub tariffs: Vec<String>,
    pub title: String,
    pub short_title: Option<String>,
    pub site_caption: Option<String>,
    pub site_value: Option<String>,
    pub app_url_template: Option<String>,
    pub phone_caption: Option<String>,
    pub phone_value: Option<String>,
    pub android_app_url: Option<String>,
    pub android_app_id: Option<String>,
    pub ios_app_url: Option<String>,
    pub ios_app_id: Option<String>,
    pub api_org_id: i64,
    pub api_id: i64,
    pub api_data: Option<String>,
    pub rating: Option<f32>,
    pub avg_eta: Option<i32>,
    pub provider_name: String,
    pub currency_code: Option<String>,
    pub image_url: Option<Url>,
    pub is_optimal: bool,
}

impl Product {
    /// A product never made it out of the store without a name; an empty name
    /// marks a row that must be excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn add_tariff(&mut self, tariff: &str) {
        if !tariff.is_empty() {
            self.tariffs.push(tariff.to_string());
        }
    }

    /// Tariff whitelist check: an empty list accepts every tariff.
    #[must_use]
    pub fn is_good_tariff(&self, tariff: &str) -> bool {
        if self.tariffs.is_empty() {
            return true;
        }
        self.tariffs.iter().any(|t| t == tariff)
    }

    /// Renders the operator block for one offer. Links that fail to parse
    /// after template substitution are dropped with a warning; the rest of
    /// the block is still produced.
    #[must_use]
    pub fn operator(&self, display_name: &str, vars: &HashMap<String, String>) -> Operator {
        let url = self
            .app_url_template
            .as_deref()
            .filter(|t| !t.is_empty())
            .and_then(|template| match render_link(template, vars) {
                Ok(link) => Some(link),
                Err(e) => {
                    tracing::warn!(product = %self.name, error = %e, "dropping unparsable deeplink");
                    None
                }
            });

        let title = if display_name.is_empty() {
            self.title.clone()
        } else {
            display_name.to_string()
        };

        Operator {
            branch_id: Some(self.api_id.to_string()),
            url,
            image: self.image_url.as_ref().map(Url::to_string),
            site: new_site(self.site_value.as_deref(), self.site_caption.as_deref()),
            background_color: BACKGROUND_COLOR.to_string(),
            short_title: self.short_title.clone(),
            store_urls: self.store_urls(vars),
            id: Some(self.id),
            text_color: TEXT_COLOR.to_string(),
            title: Some(title),
            org_id: Some(self.api_org_id.to_string()),
            phone: new_phone(self.phone_value.as_deref(), self.phone_caption.as_deref()),
            is_optimal: self.is_optimal,
        }
    }

    fn store_urls(&self, vars: &HashMap<String, String>) -> Option<StoreUrls> {
        let ios = new_store_url(
            self.ios_app_id.as_deref(),
            self.ios_app_url.as_deref(),
            vars,
            &self.name,
        );
        let android = new_store_url(
            self.android_app_id.as_deref(),
            self.android_app_url.as_deref(),
            vars,
            &self.name,
        );
        if ios.is_none() && android.is_none() {
            return None;
        }
        Some(StoreUrls { ios, android })
    }
}

fn new_store_url(
    id: Option<&str>,
    template: Option<&str>,
    vars: &HashMap<String, String>,
    product: &str,
) -> Option<StoreUrl> {
    let template = template.filter(|t| !t.is_empty())?;
    match render_link(template, vars) {
        Ok(url) => Some(StoreUrl {
            id: id.map(str::to_string),
            url,
        }),
        Err(e) => {
            tracing::warn!(product, error = %e, "dropping unparsable store url");
            None
        }
    }
}

fn new_site(value: Option<&str>, text: Option<&str>) -> Option<Site> {
    let value = value.filter(|v| !v.is_empty())?;
    Some(Site {
        value: value.to_string(),
        text: text.map(str::to_string),
    })
}

fn new_phone(value: Option<&str>, text: Option<&str>) -> Option<Phone> {
    let value = value.filter(|v| !v.is_empty())?;
    Some(Phone {
        value: Some(value.to_string()),
        text: text.map(str::to_string),
    })
}

/// Substitutes every `%key%` template variable (plain substring replace) and
/// validates the result as a URL.
fn render_link(template: &str, vars: &HashMap<String, String>) -> Result<String, url::ParseError> {
    let mut rendered = template.to_string();
    for (key, value) in vars {
        rendered = rendered.replace(key, value);
    }
    let url = Url::parse(&rendered)?;
    Ok(url.to_string())
}
