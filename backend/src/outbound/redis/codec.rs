//! Key layout and value encoding for the Redis item store.
//!
//! Items are Redis hashes. Every field value carries a two-character type tag
//! (`S:` or `N:`) so numeric attributes survive the round trip as exact
//! decimals.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::ports::ItemStoreError;
use crate::domain::{AttributeValue, Item, Table};

const STRING_TAG: &str = "S:";
const NUMBER_TAG: &str = "N:";

/// Key builder scoped to one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeySpace {
    namespace: String,
}

impl KeySpace {
    pub(crate) fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Hash holding the item stored under `key`.
    pub(crate) fn item(&self, table: Table, key: &str) -> String {
        format!("{}:{}:item:{key}", self.namespace, table.name())
    }

    /// Prefix of the sorted sets backing `index`; the indexed value follows.
    pub(crate) fn index_prefix(&self, table: Table, index: &str) -> String {
        format!("{}:{}:index:{index}:", self.namespace, table.name())
    }

    /// Sorted set listing the primary keys whose indexed attribute is `value`.
    pub(crate) fn index(&self, table: Table, index: &str, value: &str) -> String {
        format!("{}{value}", self.index_prefix(table, index))
    }

    /// Counter ordering index entries by first insertion.
    pub(crate) fn insertion_counter(&self, table: Table) -> String {
        format!("{}:{}:order", self.namespace, table.name())
    }

    /// Counter behind `ItemStore::next_sequence`.
    pub(crate) fn sequence(&self, name: &str) -> String {
        format!("{}:seq:{name}", self.namespace)
    }
}

pub(crate) fn encode_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::S(raw) => format!("{STRING_TAG}{raw}"),
        AttributeValue::N(number) => format!("{NUMBER_TAG}{number}"),
    }
}

pub(crate) fn decode_value(raw: &str) -> Result<AttributeValue, ItemStoreError> {
    if let Some(text) = raw.strip_prefix(STRING_TAG) {
        return Ok(AttributeValue::S(text.to_owned()));
    }
    if let Some(number) = raw.strip_prefix(NUMBER_TAG) {
        return Decimal::from_str(number)
            .map(AttributeValue::N)
            .map_err(|err| ItemStoreError::decode(format!("bad number `{number}`: {err}")));
    }
    Err(ItemStoreError::decode(format!(
        "value `{raw}` lacks a type tag"
    )))
}

/// Flatten an item into alternating field/value arguments.
pub(crate) fn encode_item(item: &Item) -> Vec<String> {
    item.iter()
        .flat_map(|(name, value)| [name.clone(), encode_value(value)])
        .collect()
}

/// Rebuild an item from an `HGETALL` reply; an empty reply means absent.
pub(crate) fn decode_item(fields: HashMap<String, String>) -> Result<Option<Item>, ItemStoreError> {
    if fields.is_empty() {
        return Ok(None);
    }
    fields
        .into_iter()
        .map(|(name, raw)| decode_value(&raw).map(|value| (name, value)))
        .collect::<Result<Item, _>>()
        .map(Some)
}
