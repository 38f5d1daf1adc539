//! What a successful submission leaves behind for the search page.

use crate::fields::Selection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SEARCH_PATH: &str = "/search";
pub const PREFIX_OPTION: &str = "options[prefix]=last";
const DISJUNCTION: &str = " OR ";

/// The vehicle a shopper searched for.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleRecord {
    #[serde(rename = "type")]
    pub type_: String,
    pub year: String,
    pub make: String,
    pub model: String,
}

impl From<&Selection> for VehicleRecord {
    fn from(selection: &Selection) -> Self {
        let owned = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            type_: owned(&selection.type_),
            year: owned(&selection.year),
            make: owned(&selection.make),
            model: owned(&selection.model),
        }
    }
}

/// A product returned by the fitment lookup. Attributes other than the item
/// number are kept as-is for the search page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FitmentProduct {
    #[serde(rename = "itemNumber")]
    pub item_number: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FitmentProduct {
    pub fn new(item_number: impl Into<String>) -> Self {
        Self {
            item_number: item_number.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct FitmentProductSet(Vec<FitmentProduct>);

impl FitmentProductSet {
    pub fn new(products: Vec<FitmentProduct>) -> Self {
        Self(products)
    }

    pub fn products(&self) -> &[FitmentProduct] {
        &self.0
    }

    pub fn item_numbers(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.item_number.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Search page the browser is sent to after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    query: String,
}

impl Destination {
    pub fn for_products(products: &FitmentProductSet) -> Self {
        Self {
            query: products.item_numbers().collect::<Vec<_>>().join(DISJUNCTION),
        }
    }

    /// The unencoded search query, e.g. `A1 OR B2`.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn url(&self) -> String {
        format!(
            "{}?q={}&{}",
            SEARCH_PATH,
            urlencoding::encode(&self.query),
            PREFIX_OPTION
        )
    }
}
