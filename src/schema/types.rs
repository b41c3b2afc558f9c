use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `char`, `character [varying]`, `varchar` and `bit [varying]`, optional `(n)`
static SIZED_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(bit|character|char|varchar)( varying)? ?(?:\( ?(\d+) ?\))?$")
        .expect("static regex")
});

/// `time`/`timestamp`, optional `(p)`, optional time zone clause, or the `tz` shorthands
static TEMPORAL_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(timestamp|time)(tz)? ?(?:\( ?(\d+) ?\))?(?: (with|without) time zone)?$")
        .expect("static regex")
});

/// Column types a table spec may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    DoublePrecision,
    Text,
    Character { varying: bool, length: Option<u32> },
    Bit { varying: bool, length: Option<u32> },
    Date,
    Time { precision: Option<u32>, with_time_zone: bool },
    Timestamp { precision: Option<u32>, with_time_zone: bool },
    Cidr,
    Inet,
    MacAddr,
    Uuid,
    Json,
}

/// Value representation a column is read into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int32,
    Int64,
    Float64,
    Text,
    Time,
}

impl FieldType {
    /// Parse a declared type name; `None` if it is not in the catalog
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

        let simple = match normalized.as_str() {
            "boolean" => Some(Self::Boolean),
            "smallint" => Some(Self::SmallInt),
            "integer" => Some(Self::Integer),
            "bigint" => Some(Self::BigInt),
            "real" => Some(Self::Real),
            "double precision" => Some(Self::DoublePrecision),
            "text" => Some(Self::Text),
            "date" => Some(Self::Date),
            "cidr" => Some(Self::Cidr),
            "inet" => Some(Self::Inet),
            "macaddr" => Some(Self::MacAddr),
            "uuid" => Some(Self::Uuid),
            "json" => Some(Self::Json),
            _ => None,
        };
        if simple.is_some() {
            return simple;
        }

        if let Some(caps) = SIZED_TYPE_RE.captures(&normalized) {
            let length = match caps.get(3) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            };
            let varying = caps.get(2).is_some();
            return match &caps[1] {
                "bit" => Some(Self::Bit { varying, length }),
                "varchar" if !varying => Some(Self::Character { varying: true, length }),
                "varchar" => None,
                _ => Some(Self::Character { varying, length }),
            };
        }

        if let Some(caps) = TEMPORAL_TYPE_RE.captures(&normalized) {
            let tz_shorthand = caps.get(2).is_some();
            let zone_clause = caps.get(4).map(|m| m.as_str());
            if tz_shorthand && zone_clause.is_some() {
                return None;
            }
            let with_time_zone = tz_shorthand || zone_clause == Some("with");
            let precision = match caps.get(3) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            };
            return match &caps[1] {
                "time" => Some(Self::Time { precision, with_time_zone }),
                _ => Some(Self::Timestamp { precision, with_time_zone }),
            };
        }

        None
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Boolean => ValueKind::Bool,
            Self::SmallInt | Self::Integer => ValueKind::Int32,
            Self::BigInt => ValueKind::Int64,
            Self::Real | Self::DoublePrecision => ValueKind::Float64,
            Self::Text
            | Self::Character { .. }
            | Self::Bit { .. }
            | Self::Cidr
            | Self::Inet
            | Self::MacAddr
            | Self::Uuid
            | Self::Json => ValueKind::Text,
            Self::Date | Self::Time { .. } | Self::Timestamp { .. } => ValueKind::Time,
        }
    }

    /// Date/time columns need a parse layout to read their source text
    pub fn requires_time_format(&self) -> bool {
        self.value_kind() == ValueKind::Time
    }

    /// Text, character and bit columns accept a `length`
    pub fn accepts_length(&self) -> bool {
        matches!(self, Self::Text | Self::Character { .. } | Self::Bit { .. })
    }

    /// Length written into the type name itself, as in `varchar(20)`
    pub fn declared_length(&self) -> Option<u32> {
        match self {
            Self::Character { length, .. } | Self::Bit { length, .. } => *length,
            _ => None,
        }
    }

    /// Column type as written in DDL, with `length` applied to unsized text-like columns
    pub fn sql_type(&self, length: Option<u32>) -> String {
        match (self, length) {
            (Self::Text, Some(n)) => format!("varchar({n})"),
            (Self::Character { varying, length: None }, Some(n)) => character_sql(*varying, Some(n)),
            (Self::Bit { varying, length: None }, Some(n)) => bit_sql(*varying, Some(n)),
            _ => self.to_string(),
        }
    }
}

fn character_sql(varying: bool, length: Option<u32>) -> String {
    let base = if varying { "varchar" } else { "char" };
    match length {
        Some(n) => format!("{base}({n})"),
        None => base.to_string(),
    }
}

fn bit_sql(varying: bool, length: Option<u32>) -> String {
    let base = if varying { "bit varying" } else { "bit" };
    match length {
        Some(n) => format!("{base}({n})"),
        None => base.to_string(),
    }
}

fn temporal_sql(base: &str, precision: Option<u32>, with_time_zone: bool) -> String {
    let mut out = base.to_string();
    if let Some(p) = precision {
        out.push_str(&format!("({p})"));
    }
    if with_time_zone {
        out.push_str(" with time zone");
    }
    out
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Boolean => "boolean".to_string(),
            Self::SmallInt => "smallint".to_string(),
            Self::Integer => "integer".to_string(),
            Self::BigInt => "bigint".to_string(),
            Self::Real => "real".to_string(),
            Self::DoublePrecision => "double precision".to_string(),
            Self::Text => "text".to_string(),
            Self::Character { varying, length } => character_sql(*varying, *length),
            Self::Bit { varying, length } => bit_sql(*varying, *length),
            Self::Date => "date".to_string(),
            Self::Time { precision, with_time_zone } => temporal_sql("time", *precision, *with_time_zone),
            Self::Timestamp { precision, with_time_zone } => {
                temporal_sql("timestamp", *precision, *with_time_zone)
            }
            Self::Cidr => "cidr".to_string(),
            Self::Inet => "inet".to_string(),
            Self::MacAddr => "macaddr".to_string(),
            Self::Uuid => "uuid".to_string(),
            Self::Json => "json".to_string(),
        };
        f.write_str(&s)
    }
}
