use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use salesinsight_core::{AnalyticsError, ClientId, MonthKey, ValueObject};

macro_rules! impl_category {
    ($t:ident, $what:literal, [$($variant:ident => $label:literal),+ $(,)?]) => {
        impl $t {
            /// Every category, in canonical order.
            pub const ALL: &'static [$t] = &[$($t::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($t::$variant => $label),+
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $t {
            type Err = AnalyticsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($t::$variant),)+
                    other => Err(AnalyticsError::schema(format!(
                        concat!("unknown ", $what, " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

/// Product line (`produto`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Product {
    Notebook,
    Smartphone,
    Tablet,
    Monitor,
    #[serde(rename = "Acessorios")]
    Accessories,
    Software,
}

impl_category!(Product, "product", [
    Notebook => "Notebook",
    Smartphone => "Smartphone",
    Tablet => "Tablet",
    Monitor => "Monitor",
    Accessories => "Acessorios",
    Software => "Software",
]);

/// Sales channel (`canal`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    Online,
    #[serde(rename = "Loja")]
    Store,
    Marketplace,
    #[serde(rename = "Inside Sales")]
    InsideSales,
}

impl_category!(Channel, "channel", [
    Online => "Online",
    Store => "Loja",
    Marketplace => "Marketplace",
    InsideSales => "Inside Sales",
]);

/// Sales region (`regional`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    Norte,
    Nordeste,
    #[serde(rename = "Centro-Oeste")]
    CentroOeste,
    Sudeste,
    Sul,
}

impl_category!(Region, "region", [
    Norte => "Norte",
    Nordeste => "Nordeste",
    CentroOeste => "Centro-Oeste",
    Sudeste => "Sudeste",
    Sul => "Sul",
]);

/// One ledger transaction.
///
/// Field order and serde names match the ledger file columns
/// `data,mes_ref,cliente_id,produto,canal,regional,quantidade,receita,custo,desconto_pct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "mes_ref")]
    pub month: MonthKey,
    #[serde(rename = "cliente_id")]
    pub client_id: ClientId,
    #[serde(rename = "produto")]
    pub product: Product,
    #[serde(rename = "canal")]
    pub channel: Channel,
    #[serde(rename = "regional")]
    pub region: Region,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "receita")]
    pub revenue: f64,
    #[serde(rename = "custo")]
    pub cost: f64,
    /// Discount fraction in `[0, 0.25]`.
    #[serde(rename = "desconto_pct")]
    pub discount_pct: f64,
}

impl ValueObject for SalesRecord {}

/// Composite key of the forecast table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForecastKey {
    pub month: MonthKey,
    pub channel: Channel,
    pub region: Region,
    pub product: Product,
}

/// One target row keyed by (month, channel, region, product).
///
/// Serde names match `mes_ref,canal,regional,produto,meta_receita,forecast_receita`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(rename = "mes_ref")]
    pub month: MonthKey,
    #[serde(rename = "canal")]
    pub channel: Channel,
    #[serde(rename = "regional")]
    pub region: Region,
    #[serde(rename = "produto")]
    pub product: Product,
    #[serde(rename = "meta_receita")]
    pub target_revenue: f64,
    #[serde(rename = "forecast_receita")]
    pub forecast_revenue: f64,
}

impl ValueObject for ForecastRecord {}

impl ForecastRecord {
    pub fn key(&self) -> ForecastKey {
        ForecastKey {
            month: self.month,
            channel: self.channel,
            region: self.region,
            product: self.product,
        }
    }
}
