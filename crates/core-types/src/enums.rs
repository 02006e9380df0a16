use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Looks `text` up among `candidates` by their display name, ignoring case and
/// surrounding whitespace.
fn parse_category<T: Copy>(
    field: &'static str,
    text: &str,
    candidates: &[T],
    name: impl Fn(&T) -> &'static str,
) -> Result<T, CoreError> {
    let needle = text.trim();
    candidates
        .iter()
        .find(|c| name(*c).eq_ignore_ascii_case(needle))
        .copied()
        .ok_or_else(|| CoreError::InvalidCategory {
            field,
            value: text.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    Member,
    Normal,
}

impl CustomerType {
    pub const ALL: [CustomerType; 2] = [CustomerType::Member, CustomerType::Normal];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Member => "Member",
            CustomerType::Normal => "Normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

/// The payment methods a till accepts.
///
/// Declaration order doubles as the popularity tie-break: when two methods are
/// equally common in a city, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "Credit card")]
    CreditCard,
    Ewallet,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::Ewallet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "Credit card",
            PaymentMethod::Ewallet => "Ewallet",
        }
    }
}

/// Product categories carried by the store. Variants are declared in
/// alphabetical order of their display names, so the derived `Ord` is the
/// lexicographic order used to break ranking ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductLine {
    #[serde(rename = "Electronic accessories")]
    ElectronicAccessories,
    #[serde(rename = "Fashion accessories")]
    FashionAccessories,
    #[serde(rename = "Food and beverages")]
    FoodAndBeverages,
    #[serde(rename = "Health and beauty")]
    HealthAndBeauty,
    #[serde(rename = "Home and lifestyle")]
    HomeAndLifestyle,
    #[serde(rename = "Sports and travel")]
    SportsAndTravel,
}

impl ProductLine {
    pub const ALL: [ProductLine; 6] = [
        ProductLine::ElectronicAccessories,
        ProductLine::FashionAccessories,
        ProductLine::FoodAndBeverages,
        ProductLine::HealthAndBeauty,
        ProductLine::HomeAndLifestyle,
        ProductLine::SportsAndTravel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductLine::ElectronicAccessories => "Electronic accessories",
            ProductLine::FashionAccessories => "Fashion accessories",
            ProductLine::FoodAndBeverages => "Food and beverages",
            ProductLine::HealthAndBeauty => "Health and beauty",
            ProductLine::HomeAndLifestyle => "Home and lifestyle",
            ProductLine::SportsAndTravel => "Sports and travel",
        }
    }
}

impl FromStr for CustomerType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category("customer type", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category("gender", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category("payment method", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for ProductLine {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category("product line", s, &Self::ALL, Self::as_str)
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ProductLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a customer's position within the spend distribution is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentileMethod {
    /// Fraction of customers whose spend is less than or equal to this one's.
    #[default]
    CumeDist,
    /// `(rank - 1) / (n - 1)` over the ascending minimum rank.
    PercentRank,
}

/// What qualifies a customer as a repeat customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatDefinition {
    /// At least one ordered pair of purchases falls within the window.
    #[default]
    PairsWithinWindow,
    /// Two or more purchases, regardless of spacing.
    MultiplePurchases,
}
