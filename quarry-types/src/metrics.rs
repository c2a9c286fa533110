//! Metric keys, metric classes and tagged metric values.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reporting cadence of a fundamentals record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    /// Fiscal quarter.
    Quarterly,
    /// Fiscal year.
    Annual,
}

impl PeriodType {
    /// Stable lowercase identifier for logs and provider requests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Financial statement a metric belongs to; refresh intervals are configured per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricClass {
    /// Revenue, costs, profit lines and per-share earnings.
    IncomeStatement,
    /// Assets, liabilities, equity, cash and inventory.
    BalanceSheet,
    /// Operating cash flow, capital expenditure and free cash flow.
    CashFlow,
}

/// Canonical metric identifiers. Serialized in the camelCase form used by the web
/// application (`totalRevenue`, `netIncome`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    /// Total revenue.
    TotalRevenue,
    /// Cost of revenue.
    CostOfRevenue,
    /// Gross profit.
    GrossProfit,
    /// Operating income.
    OperatingIncome,
    /// Earnings before interest and taxes.
    Ebit,
    /// Pre-tax income.
    IncomeBeforeTax,
    /// Interest expense.
    InterestExpense,
    /// Income tax expense.
    IncomeTaxExpense,
    /// Net income.
    NetIncome,
    /// Basic earnings per share.
    BasicEps,
    /// Diluted earnings per share.
    DilutedEps,
    /// Total assets.
    TotalAssets,
    /// Current assets.
    TotalCurrentAssets,
    /// Current liabilities.
    TotalCurrentLiabilities,
    /// Stockholders' equity.
    TotalStockholderEquity,
    /// Total liabilities.
    TotalLiabilities,
    /// Cash and cash equivalents.
    Cash,
    /// Inventory.
    Inventory,
    /// Cash flow from operating activities.
    OperatingCashFlow,
    /// Capital expenditure (usually reported negative).
    CapitalExpenditure,
    /// Free cash flow.
    FreeCashFlow,
}

impl MetricKey {
    /// Every metric, in canonical order.
    pub const ALL: [Self; 21] = [
        Self::TotalRevenue,
        Self::CostOfRevenue,
        Self::GrossProfit,
        Self::OperatingIncome,
        Self::Ebit,
        Self::IncomeBeforeTax,
        Self::InterestExpense,
        Self::IncomeTaxExpense,
        Self::NetIncome,
        Self::BasicEps,
        Self::DilutedEps,
        Self::TotalAssets,
        Self::TotalCurrentAssets,
        Self::TotalCurrentLiabilities,
        Self::TotalStockholderEquity,
        Self::TotalLiabilities,
        Self::Cash,
        Self::Inventory,
        Self::OperatingCashFlow,
        Self::CapitalExpenditure,
        Self::FreeCashFlow,
    ];

    /// camelCase identifier matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalRevenue => "totalRevenue",
            Self::CostOfRevenue => "costOfRevenue",
            Self::GrossProfit => "grossProfit",
            Self::OperatingIncome => "operatingIncome",
            Self::Ebit => "ebit",
            Self::IncomeBeforeTax => "incomeBeforeTax",
            Self::InterestExpense => "interestExpense",
            Self::IncomeTaxExpense => "incomeTaxExpense",
            Self::NetIncome => "netIncome",
            Self::BasicEps => "basicEps",
            Self::DilutedEps => "dilutedEps",
            Self::TotalAssets => "totalAssets",
            Self::TotalCurrentAssets => "totalCurrentAssets",
            Self::TotalCurrentLiabilities => "totalCurrentLiabilities",
            Self::TotalStockholderEquity => "totalStockholderEquity",
            Self::TotalLiabilities => "totalLiabilities",
            Self::Cash => "cash",
            Self::Inventory => "inventory",
            Self::OperatingCashFlow => "operatingCashFlow",
            Self::CapitalExpenditure => "capitalExpenditure",
            Self::FreeCashFlow => "freeCashFlow",
        }
    }

    /// Statement the metric is reported on.
    #[must_use]
    pub const fn class(self) -> MetricClass {
        match self {
            Self::TotalRevenue
            | Self::CostOfRevenue
            | Self::GrossProfit
            | Self::OperatingIncome
            | Self::Ebit
            | Self::IncomeBeforeTax
            | Self::InterestExpense
            | Self::IncomeTaxExpense
            | Self::NetIncome
            | Self::BasicEps
            | Self::DilutedEps => MetricClass::IncomeStatement,
            Self::TotalAssets
            | Self::TotalCurrentAssets
            | Self::TotalCurrentLiabilities
            | Self::TotalStockholderEquity
            | Self::TotalLiabilities
            | Self::Cash
            | Self::Inventory => MetricClass::BalanceSheet,
            Self::OperatingCashFlow | Self::CapitalExpenditure | Self::FreeCashFlow => {
                MetricClass::CashFlow
            }
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved metric: the numeric value (if any) and whether it is an ambiguous zero.
///
/// `suspect` is set for a value of exactly zero, which providers also use as a
/// placeholder for missing data. Suspect values are still surfaced verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricValue {
    /// Numeric value, `None` when the provider reported the field as absent.
    pub value: Option<Decimal>,
    /// True when `value` is an ambiguous zero.
    pub suspect: bool,
}

impl MetricValue {
    /// Known absence: no value, not suspect.
    pub const MISSING: Self = Self {
        value: None,
        suspect: false,
    };

    /// Tag a value: exactly zero is suspect, anything else (including `None`) is not.
    #[must_use]
    pub fn tagged(value: Option<Decimal>) -> Self {
        Self {
            value,
            suspect: value.is_some_and(|v| v.is_zero()),
        }
    }

    /// A value that needs no zero heuristics (e.g. derived from trusted inputs).
    #[must_use]
    pub const fn trusted(value: Decimal) -> Self {
        Self {
            value: Some(value),
            suspect: false,
        }
    }

    /// True when the value is present and not suspect.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        self.value.is_some() && !self.suspect
    }
}
