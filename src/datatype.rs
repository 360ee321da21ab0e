// used for timestamps and dates in literals
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
// used for decimal numbers
use bigdecimal::{BigDecimal, ToPrimitive};

// used when parsing a string to a number or decimal
use std::str::FromStr;
// used to print out readable forms of a data type
use std::fmt;
// used to order values of the same type
use std::cmp::Ordering;

/// Type tag of a literal or of a filterable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    DateTime,
    Date,
}

impl DataType {
    /// Whether `<`, `>` and between make sense for this type.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            DataType::Integer | DataType::Float | DataType::Decimal | DataType::DateTime | DataType::Date
        )
    }
    /// The value a non-nullable property holds when it has not been set.
    pub fn default_value(&self) -> Value {
        match self {
            DataType::String => Value::String(String::new()),
            DataType::Integer => Value::Integer(0),
            DataType::Float => Value::Float(0.0),
            DataType::Decimal => Value::Decimal(BigDecimal::from(0)),
            DataType::Boolean => Value::Boolean(false),
            DataType::DateTime => Value::DateTime(DateTime::<Utc>::default()),
            DataType::Date => Value::Date(NaiveDate::default()),
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Decimal => "decimal",
            DataType::Boolean => "boolean",
            DataType::DateTime => "datetime",
            DataType::Date => "date",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ------------- Value -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // date-times without an offset are taken to be UTC already
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn looks_decimal(s: &str) -> bool {
    s.contains(['.', 'e', 'E']) && s.chars().any(|c| c.is_ascii_digit())
}

// decimals always carry a point so that they read back as decimals
fn with_point(s: String) -> String {
    if s.contains(['.', 'e', 'E']) || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        s + ".0"
    }
}

impl Value {
    /// Infers the most specific value a bare (unquoted) literal denotes.
    pub fn infer(literal: &str) -> Value {
        if literal.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if literal.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        if let Ok(i) = literal.parse::<i64>() {
            return Value::Integer(i);
        }
        if looks_decimal(literal) {
            if let Ok(d) = BigDecimal::from_str(literal) {
                return Value::Decimal(d);
            }
        }
        if let Some(d) = parse_date(literal) {
            return Value::Date(d);
        }
        if let Some(dt) = parse_datetime(literal) {
            return Value::DateTime(dt);
        }
        Value::String(literal.to_owned())
    }

    /// Parses text as a specific type, using invariant formats.
    pub fn parse_as(text: &str, data_type: DataType) -> Option<Value> {
        let text = if data_type == DataType::String { text } else { text.trim() };
        match data_type {
            DataType::String => Some(Value::String(text.to_owned())),
            DataType::Integer => text.parse::<i64>().ok().map(Value::Integer),
            DataType::Float => text.parse::<f64>().ok().map(Value::Float),
            DataType::Decimal => BigDecimal::from_str(text).ok().map(Value::Decimal),
            DataType::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    Some(Value::Boolean(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Some(Value::Boolean(false))
                } else {
                    None
                }
            }
            DataType::DateTime => parse_datetime(text)
                .or_else(|| parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc()))
                .map(Value::DateTime),
            DataType::Date => parse_date(text)
                .or_else(|| parse_datetime(text).and_then(midnight_date))
                .map(Value::Date),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::String(_) => DataType::String,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Decimal(_) => DataType::Decimal,
            Value::Boolean(_) => DataType::Boolean,
            Value::DateTime(_) => DataType::DateTime,
            Value::Date(_) => DataType::Date,
        }
    }

    /// Converts the value into the native representation of `target`.
    /// Returns `None` when the value has no sensible reading as that type.
    pub fn coerce(&self, target: DataType) -> Option<Value> {
        if self.data_type() == target {
            return Some(self.clone());
        }
        match (self, target) {
            (Value::Integer(i), DataType::Float) => Some(Value::Float(*i as f64)),
            (Value::Integer(i), DataType::Decimal) => Some(Value::Decimal(BigDecimal::from(*i))),
            (Value::Decimal(d), DataType::Float) => d.to_f64().map(Value::Float),
            (Value::Decimal(d), DataType::Integer) if d.is_integer() => d.to_i64().map(Value::Integer),
            (Value::Date(d), DataType::DateTime) => {
                d.and_hms_opt(0, 0, 0).map(|n| Value::DateTime(n.and_utc()))
            }
            (Value::DateTime(dt), DataType::Date) => midnight_date(*dt).map(Value::Date),
            _ => Value::parse_as(&self.to_literal(), target),
        }
    }

    /// Maps values onto the forms literal inference produces, so that a
    /// programmatically built value is indistinguishable from a parsed one.
    pub fn canonical(self) -> Value {
        match self {
            Value::Float(f) => match BigDecimal::from_str(&f.to_string()) {
                Ok(d) => Value::Decimal(d),
                Err(_) => Value::String(f.to_string()),
            },
            other => other,
        }
    }

    /// The invariant textual form of the value.
    pub fn to_literal(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => with_point(f.to_string()),
            Value::Decimal(d) => with_point(d.to_string()),
            Value::Boolean(b) => b.to_string(),
            Value::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::DateTime(_) | Value::Date(_) => serde_json::Value::String(self.to_literal()),
        }
    }
}

fn midnight_date(dt: DateTime<Utc>) -> Option<NaiveDate> {
    let naive = dt.naive_utc();
    if naive.time() == chrono::NaiveTime::MIN {
        Some(naive.date())
    } else {
        None
    }
}

// Values only order against values of the same type
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_literal())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

// ------------- Field Types -------------

/// A Rust type that can back a filterable property.
pub trait FieldType {
    // static stuff which needs to be implemented downstream
    const DATA_TYPE: DataType;
    const NULLABLE: bool = false;
    fn into_value(self) -> Option<Value>;
}

// values outside the i64 range read as null
macro_rules! integer_field_types {
    ($($t:ty),*) => {
        $(
            impl FieldType for $t {
                const DATA_TYPE: DataType = DataType::Integer;
                fn into_value(self) -> Option<Value> {
                    i64::try_from(self).ok().map(Value::Integer)
                }
            }
        )*
    };
}

integer_field_types!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FieldType for String {
    const DATA_TYPE: DataType = DataType::String;
    fn into_value(self) -> Option<Value> {
        Some(Value::String(self))
    }
}
impl FieldType for f32 {
    const DATA_TYPE: DataType = DataType::Float;
    fn into_value(self) -> Option<Value> {
        Some(Value::Float(f64::from(self)))
    }
}
impl FieldType for f64 {
    const DATA_TYPE: DataType = DataType::Float;
    fn into_value(self) -> Option<Value> {
        Some(Value::Float(self))
    }
}
impl FieldType for BigDecimal {
    const DATA_TYPE: DataType = DataType::Decimal;
    fn into_value(self) -> Option<Value> {
        Some(Value::Decimal(self))
    }
}
impl FieldType for bool {
    const DATA_TYPE: DataType = DataType::Boolean;
    fn into_value(self) -> Option<Value> {
        Some(Value::Boolean(self))
    }
}
impl FieldType for DateTime<Utc> {
    const DATA_TYPE: DataType = DataType::DateTime;
    fn into_value(self) -> Option<Value> {
        Some(Value::DateTime(self))
    }
}
impl FieldType for NaiveDateTime {
    const DATA_TYPE: DataType = DataType::DateTime;
    fn into_value(self) -> Option<Value> {
        Some(Value::DateTime(self.and_utc()))
    }
}
impl FieldType for NaiveDate {
    const DATA_TYPE: DataType = DataType::Date;
    fn into_value(self) -> Option<Value> {
        Some(Value::Date(self))
    }
}
impl<V: FieldType> FieldType for Option<V> {
    const DATA_TYPE: DataType = V::DATA_TYPE;
    const NULLABLE: bool = true;
    fn into_value(self) -> Option<Value> {
        self.and_then(FieldType::into_value)
    }
}
