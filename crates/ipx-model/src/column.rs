//! Typed column keys for the measurement table.
//!
//! Stage logic selects columns by parsing names into [`ItemColumn`] or
//! [`ShiftColumn`]; the legacy string form (`IP_Item_5_Izq_Respuesta`,
//! `CO_Item_5_Der`) only appears at the table boundary through `Display`
//! and `FromStr`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Presentation order of the plain IP items.
pub const ORDER_COLUMN: &str = "Orden_IP_Items";
/// Last plain IP item presented.
pub const LAST_ITEM_COLUMN: &str = "Ultimo_IP_Item";
/// Presentation order of the candidate-associated items (`"<n>_<side>"`).
pub const ASSOCIATED_ORDER_COLUMN: &str = "Orden_IP_Items_Asociados";
/// Last candidate-associated item presented.
pub const LAST_ASSOCIATED_COLUMN: &str = "Ultimo_IP_Item_Asociado";
/// Prefix of the associated order list.
pub const FIRST_ASSOCIATED_COLUMN: &str = "Primeros_IP_Items_Asociados";
/// Ideological group used for stratification.
pub const CATEGORY_COLUMN: &str = "Categoria_PASO_2023";
/// Participant identifier.
pub const ID_COLUMN: &str = "ID";
/// Subject identifier taken from the payload by the materializer.
pub const SUBJECT_COLUMN: &str = "id";
/// Key prefix of stimulus entries inside the payload.
pub const ITEM_KEY_PREFIX: &str = "IP_item_";

const ITEM_COLUMN_PREFIX: &str = "IP_Item_";

/// Candidate side a measurement was taken under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Izq,
    Der,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Izq, Side::Der];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Izq => "Izq",
            Side::Der => "Der",
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Izq => Side::Der,
            Side::Der => Side::Izq,
        }
    }

    /// Case-insensitive match of a raw key segment.
    pub fn parse_token(token: &str) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|side| side.as_str().eq_ignore_ascii_case(token.trim()))
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured quantity of an item response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Respuesta,
    Candidato,
    Tiempo,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Respuesta, Field::Candidato, Field::Tiempo];
    /// Fields repaired by the paired imputer.
    pub const NUMERIC: [Field; 2] = [Field::Respuesta, Field::Tiempo];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Respuesta => "Respuesta",
            Field::Candidato => "Candidato",
            Field::Tiempo => "Tiempo",
        }
    }

    pub fn parse_token(token: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(token.trim()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `IP_Item_<n>[_<Side>]_<Field>`; no side means the baseline measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemColumn {
    pub item: u32,
    pub side: Option<Side>,
    pub field: Field,
}

impl ItemColumn {
    pub fn baseline(item: u32, field: Field) -> Self {
        Self {
            item,
            side: None,
            field,
        }
    }

    pub fn sided(item: u32, side: Side, field: Field) -> Self {
        Self {
            item,
            side: Some(side),
            field,
        }
    }

    /// Parse a legacy column name, returning `None` for anything else.
    pub fn parse(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Same item and field on the opposite side. Baselines have no sibling.
    pub fn sibling(self) -> Option<Self> {
        self.side.map(|side| Self::sided(self.item, side.other(), self.field))
    }

    /// Recognize a flattened payload path such as
    /// `fase_3.IP_modificada.IP_item_5_Izq_modified.respuesta`.
    ///
    /// The last segment names the field and the one before it the stimulus
    /// key. Side-qualified keys carry the side somewhere after the number.
    pub fn from_flat_path(path: &str) -> Option<Self> {
        let mut segments = path.rsplit('.');
        let field = Field::parse_token(segments.next()?)?;
        let key = segments.next()?;
        let head = key.get(..ITEM_KEY_PREFIX.len())?;
        if !head.eq_ignore_ascii_case(ITEM_KEY_PREFIX) {
            return None;
        }
        let parts: Vec<&str> = key.split('_').collect();
        let item = parts.get(2)?.parse::<u32>().ok()?;
        if parts.len() == 3 {
            return Some(Self::baseline(item, field));
        }
        let side = parts[3..].iter().find_map(|part| Side::parse_token(part))?;
        Some(Self::sided(item, side, field))
    }
}

impl fmt::Display for ItemColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            Some(side) => write!(f, "{ITEM_COLUMN_PREFIX}{}_{side}_{}", self.item, self.field),
            None => write!(f, "{ITEM_COLUMN_PREFIX}{}_{}", self.item, self.field),
        }
    }
}

impl FromStr for ItemColumn {
    type Err = ModelError;

    fn from_str(name: &str) -> Result<Self> {
        let invalid = |reason| ModelError::InvalidColumn {
            name: name.to_string(),
            reason,
        };
        let rest = name
            .strip_prefix(ITEM_COLUMN_PREFIX)
            .ok_or_else(|| invalid("missing IP_Item_ prefix"))?;
        let parts: Vec<&str> = rest.split('_').collect();
        let item = parts
            .first()
            .and_then(|part| part.parse::<u32>().ok())
            .ok_or_else(|| invalid("item number is not an integer"))?;
        let exact_field = |token: &str| Field::ALL.into_iter().find(|f| f.as_str() == token);
        let exact_side = |token: &str| Side::ALL.into_iter().find(|s| s.as_str() == token);
        match parts.as_slice() {
            [_, field] => exact_field(field)
                .map(|field| Self::baseline(item, field))
                .ok_or_else(|| invalid("unknown field")),
            [_, side, field] => {
                let side = exact_side(side).ok_or_else(|| invalid("unknown side"))?;
                let field = exact_field(field).ok_or_else(|| invalid("unknown field"))?;
                Ok(Self::sided(item, side, field))
            }
            _ => Err(invalid("unexpected number of segments")),
        }
    }
}

/// Change-of-Opinion or Change-of-Time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShiftKind {
    Opinion,
    Time,
}

impl ShiftKind {
    pub const ALL: [ShiftKind; 2] = [ShiftKind::Opinion, ShiftKind::Time];

    pub fn prefix(self) -> &'static str {
        match self {
            ShiftKind::Opinion => "CO",
            ShiftKind::Time => "CT",
        }
    }

    /// The measured field this shift is derived from.
    pub fn source_field(self) -> Field {
        match self {
            ShiftKind::Opinion => Field::Respuesta,
            ShiftKind::Time => Field::Tiempo,
        }
    }
}

/// `CO_Item_<n>_<Side>` / `CT_Item_<n>_<Side>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShiftColumn {
    pub kind: ShiftKind,
    pub item: u32,
    pub side: Side,
}

impl ShiftColumn {
    pub fn new(kind: ShiftKind, item: u32, side: Side) -> Self {
        Self { kind, item, side }
    }

    pub fn parse(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// The side column this shift subtracts the baseline from.
    pub fn side_column(self) -> ItemColumn {
        ItemColumn::sided(self.item, self.side, self.kind.source_field())
    }

    pub fn baseline_column(self) -> ItemColumn {
        ItemColumn::baseline(self.item, self.kind.source_field())
    }
}

impl fmt::Display for ShiftColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_Item_{}_{}", self.kind.prefix(), self.item, self.side)
    }
}

impl FromStr for ShiftColumn {
    type Err = ModelError;

    fn from_str(name: &str) -> Result<Self> {
        let invalid = |reason| ModelError::InvalidColumn {
            name: name.to_string(),
            reason,
        };
        let parts: Vec<&str> = name.split('_').collect();
        let [prefix, "Item", item, side] = parts.as_slice() else {
            return Err(invalid("expected <CO|CT>_Item_<n>_<Side>"));
        };
        let kind = ShiftKind::ALL
            .into_iter()
            .find(|kind| kind.prefix() == *prefix)
            .ok_or_else(|| invalid("unknown shift prefix"))?;
        let item = item
            .parse::<u32>()
            .map_err(|_| invalid("item number is not an integer"))?;
        let side = Side::ALL
            .into_iter()
            .find(|s| s.as_str() == *side)
            .ok_or_else(|| invalid("unknown side"))?;
        Ok(Self::new(kind, item, side))
    }
}
