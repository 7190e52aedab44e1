//! Routes and the feeds they come from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{RouteId, SourceId};

/// The feed a route was imported from, with the credit it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: SourceId,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Licence attribution text, if the feed requires one.
    #[serde(default)]
    pub attribution: Option<String>,
}

impl DataSource {
    pub fn new(id: SourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: None,
            attribution: None,
        }
    }

    /// The text to show when crediting this source.
    pub fn credit(&self) -> String {
        let text = self.attribution.as_deref().unwrap_or(&self.name);
        match &self.url {
            Some(url) => format!("{text} ({url})"),
            None => text.to_string(),
        }
    }
}

/// A named path tied to a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub source: DataSource,
    pub line_name: String,
    /// Producer service code; differing codes allow split trips to merge.
    #[serde(default)]
    pub service_code: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub outbound_description: Option<String>,
    #[serde(default)]
    pub inbound_description: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Route {
    pub fn new(id: RouteId, source: DataSource, line_name: impl Into<String>) -> Self {
        Self {
            id,
            source,
            line_name: line_name.into(),
            service_code: None,
            brand: None,
            description: None,
            outbound_description: None,
            inbound_description: None,
            operator: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Whether the route is valid on `date`.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| start <= date)
            && self.end_date.is_none_or(|end| date <= end)
    }

    /// Whether the route is valid on any day from `from` to `until`, inclusive.
    pub fn is_valid_between(&self, from: NaiveDate, until: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| start <= until)
            && self.end_date.is_none_or(|end| from <= end)
    }
}
