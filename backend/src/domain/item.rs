//! Generic item model shared by every storage adapter.
//!
//! The key-value substrate knows nothing about accounts or credentials: it
//! stores flat [`Item`]s of string and numeric attributes in three named
//! [`Table`]s, two of which carry a secondary index on `user_id`.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;

/// Name of the secondary index on `user_id`.
pub const USER_ID_INDEX: &str = "user_id-index";

/// Attribute holding the owning account on indexed tables.
pub const USER_ID_ATTRIBUTE: &str = "user_id";

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// String attribute.
    S(String),
    /// Numeric attribute.
    N(Decimal),
}

impl AttributeValue {
    /// Borrow the string payload, if any.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(value) => Some(value.as_str()),
            Self::N(_) => None,
        }
    }

    /// Copy the numeric payload, if any.
    pub fn as_n(&self) -> Option<Decimal> {
        match self {
            Self::N(value) => Some(*value),
            Self::S(_) => None,
        }
    }
}

/// Flat attribute map stored under one primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item(BTreeMap<String, AttributeValue>);

impl Item {
    /// Create an empty item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style string attribute insertion.
    pub fn with_s(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), AttributeValue::S(value.into()));
        self
    }

    /// Builder-style numeric attribute insertion.
    pub fn with_n(mut self, name: impl Into<String>, value: Decimal) -> Self {
        self.0.insert(name.into(), AttributeValue::N(value));
        self
    }

    /// Insert or replace an attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.0.insert(name.into(), value);
    }

    /// Look up an attribute.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    /// Iterate over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the item has no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AttributeValue)> for Item {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Tables provisioned in the substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// Accounts keyed by `user_id`.
    Users,
    /// Credentials keyed by `api_key`, indexed by `user_id`.
    ApiKeys,
    /// Ledger entries keyed by `transaction_id`, indexed by `user_id`.
    Transactions,
}

impl Table {
    /// All tables, in a stable order.
    pub const ALL: [Table; 3] = [Table::Users, Table::ApiKeys, Table::Transactions];

    /// Substrate table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::ApiKeys => "api_keys",
            Self::Transactions => "transactions",
        }
    }

    /// Attribute holding the primary key.
    pub fn key_attribute(self) -> &'static str {
        match self {
            Self::Users => "user_id",
            Self::ApiKeys => "api_key",
            Self::Transactions => "transaction_id",
        }
    }

    /// Secondary index as `(index name, indexed attribute)`, if the table has one.
    pub fn index(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Users => None,
            Self::ApiKeys | Self::Transactions => Some((USER_ID_INDEX, USER_ID_ATTRIBUTE)),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Server-side mutation applied to a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateExpression {
    /// Atomically add `amount` to a numeric attribute.
    Add { attribute: String, amount: Decimal },
}
