//! Item catalog and the column selectors used by chart rendering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::column::{Field, ItemColumn, ShiftColumn, ShiftKind, Side};
use crate::error::{ModelError, Result};

/// Items that carry both a baseline and candidate-paired measurements.
pub const DEFAULT_ITEM_NUMBERS: [u32; 20] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 16, 19, 20, 22, 23, 24, 25, 27, 28, 29, 30,
];

/// Metadata for one stimulus item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    /// Free-form item type shown in chart titles (e.g. "Pro", "Con").
    #[serde(default)]
    pub kind: Option<String>,
}

impl ItemInfo {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            title: None,
            kind: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCatalog {
    items: Vec<ItemInfo>,
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::from_numbers(DEFAULT_ITEM_NUMBERS)
    }
}

impl ItemCatalog {
    pub fn new(items: Vec<ItemInfo>) -> Self {
        Self { items }
    }

    pub fn from_numbers(numbers: impl IntoIterator<Item = u32>) -> Self {
        Self {
            items: numbers.into_iter().map(ItemInfo::new).collect(),
        }
    }

    pub fn items(&self) -> &[ItemInfo] {
        &self.items
    }

    pub fn numbers(&self) -> Vec<u32> {
        self.items.iter().map(|item| item.number).collect()
    }

    pub fn get(&self, number: u32) -> Option<&ItemInfo> {
        self.items.iter().find(|item| item.number == number)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Column-selector token accepted by the chart renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartSelector {
    IpRespuesta,
    IpIzqRespuesta,
    IpDerRespuesta,
    IpTiempo,
    IpIzqTiempo,
    IpDerTiempo,
    CoProIzq,
    CoConIzq,
    CoProDer,
    CoConDer,
    CtProIzq,
    CtConIzq,
    CtProDer,
    CtConDer,
}

impl ChartSelector {
    pub const ALL: [ChartSelector; 14] = [
        ChartSelector::IpRespuesta,
        ChartSelector::IpIzqRespuesta,
        ChartSelector::IpDerRespuesta,
        ChartSelector::IpTiempo,
        ChartSelector::IpIzqTiempo,
        ChartSelector::IpDerTiempo,
        ChartSelector::CoProIzq,
        ChartSelector::CoConIzq,
        ChartSelector::CoProDer,
        ChartSelector::CoConDer,
        ChartSelector::CtProIzq,
        ChartSelector::CtConIzq,
        ChartSelector::CtProDer,
        ChartSelector::CtConDer,
    ];

    pub fn token(self) -> &'static str {
        match self {
            ChartSelector::IpRespuesta => "IP_Respuesta",
            ChartSelector::IpIzqRespuesta => "IP_Izq_Respuesta",
            ChartSelector::IpDerRespuesta => "IP_Der_Respuesta",
            ChartSelector::IpTiempo => "IP_Tiempo",
            ChartSelector::IpIzqTiempo => "IP_Izq_Tiempo",
            ChartSelector::IpDerTiempo => "IP_Der_Tiempo",
            ChartSelector::CoProIzq => "CO_Pro_Izq",
            ChartSelector::CoConIzq => "CO_Con_Izq",
            ChartSelector::CoProDer => "CO_Pro_Der",
            ChartSelector::CoConDer => "CO_Con_Der",
            ChartSelector::CtProIzq => "CT_Pro_Izq",
            ChartSelector::CtConIzq => "CT_Con_Izq",
            ChartSelector::CtProDer => "CT_Pro_Der",
            ChartSelector::CtConDer => "CT_Con_Der",
        }
    }

    /// Concrete column charted for `item`.
    pub fn column_name(self, item: u32) -> String {
        match self {
            ChartSelector::IpRespuesta => ItemColumn::baseline(item, Field::Respuesta).to_string(),
            ChartSelector::IpIzqRespuesta => {
                ItemColumn::sided(item, Side::Izq, Field::Respuesta).to_string()
            }
            ChartSelector::IpDerRespuesta => {
                ItemColumn::sided(item, Side::Der, Field::Respuesta).to_string()
            }
            ChartSelector::IpTiempo => ItemColumn::baseline(item, Field::Tiempo).to_string(),
            ChartSelector::IpIzqTiempo => {
                ItemColumn::sided(item, Side::Izq, Field::Tiempo).to_string()
            }
            ChartSelector::IpDerTiempo => {
                ItemColumn::sided(item, Side::Der, Field::Tiempo).to_string()
            }
            ChartSelector::CoProIzq | ChartSelector::CoConIzq => {
                ShiftColumn::new(ShiftKind::Opinion, item, Side::Izq).to_string()
            }
            ChartSelector::CoProDer | ChartSelector::CoConDer => {
                ShiftColumn::new(ShiftKind::Opinion, item, Side::Der).to_string()
            }
            ChartSelector::CtProIzq | ChartSelector::CtConIzq => {
                ShiftColumn::new(ShiftKind::Time, item, Side::Izq).to_string()
            }
            ChartSelector::CtProDer | ChartSelector::CtConDer => {
                ShiftColumn::new(ShiftKind::Time, item, Side::Der).to_string()
            }
        }
    }

    /// Value-axis label for the chart.
    pub fn axis_label(self) -> &'static str {
        if self.token().contains("Tiempo") {
            "Tiempo de Respuesta"
        } else if self.token().starts_with("CO_") {
            "Cambio de Opinión"
        } else {
            "Valor"
        }
    }

    /// Fixed value-axis range, when the scale is bounded.
    pub fn value_range(self) -> Option<(f64, f64)> {
        match self {
            ChartSelector::CoProIzq
            | ChartSelector::CoConIzq
            | ChartSelector::CoProDer
            | ChartSelector::CoConDer => Some((-2.0, 2.0)),
            ChartSelector::IpRespuesta => Some((1.0, 5.0)),
            _ => None,
        }
    }
}

impl fmt::Display for ChartSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ChartSelector {
    type Err = ModelError;

    fn from_str(token: &str) -> Result<Self> {
        ChartSelector::ALL
            .into_iter()
            .find(|selector| selector.token() == token.trim())
            .ok_or_else(|| ModelError::UnknownSelector(token.to_string()))
    }
}
