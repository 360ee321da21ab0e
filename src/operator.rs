// used to keep the one-to-one mapping between mnemonics and operators
use bimap::BiMap;
use lazy_static::lazy_static;
use std::fmt;

/// How many values an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// No value, e.g. `=null=`.
    Unary,
    /// Exactly one value.
    Binary,
    /// One or more values.
    Variadic,
    /// Exactly two values.
    Pair,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Unary => count == 0,
            Arity::Binary => count == 1,
            Arity::Variadic => count >= 1,
            Arity::Pair => count == 2,
        }
    }
    pub fn describe(&self) -> &'static str {
        match self {
            Arity::Unary => "no value",
            Arity::Binary => "exactly one value",
            Arity::Variadic => "one or more values",
            Arity::Pair => "exactly two values",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    In,
    Out,
    IsNull,
    IsNotNull,
    Between,
}

lazy_static! {
    // Text to operator lookup for the lexer and the parser, filled from
    // `Operator::mnemonic` so both directions agree.
    static ref MNEMONICS: BiMap<&'static str, Operator> =
        Operator::ALL.iter().map(|op| (op.mnemonic(), *op)).collect();
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::Like,
        Operator::In,
        Operator::Out,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::Between,
    ];

    /// Looks up an operator by its mnemonic, ignoring case.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Operator> {
        MNEMONICS
            .get_by_left(mnemonic.to_ascii_lowercase().as_str())
            .copied()
    }
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::NotEqual => "ne",
            Operator::GreaterThan => "gt",
            Operator::GreaterThanOrEqual => "ge",
            Operator::LessThan => "lt",
            Operator::LessThanOrEqual => "le",
            Operator::Like => "like",
            Operator::In => "in",
            Operator::Out => "out",
            Operator::IsNull => "null",
            Operator::IsNotNull => "notnull",
            Operator::Between => "bt",
        }
    }
    pub fn arity(&self) -> Arity {
        match self {
            Operator::IsNull | Operator::IsNotNull => Arity::Unary,
            Operator::In | Operator::Out => Arity::Variadic,
            Operator::Between => Arity::Pair,
            _ => Arity::Binary,
        }
    }
    /// Operators that need the compared type to have an ordering.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::Between
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "={}=", self.mnemonic())
    }
}
