//! Logical column types and the parser for catalog type descriptor strings.
//! Stored columns carry their type as text (`bigint`, `decimal(10,2)`,
//! `array<struct<a:int>>`); this module turns that text into a `DataType`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{CatalogError, CatalogResult};

pub const MAX_DECIMAL_PRECISION: u8 = 38;
pub const DEFAULT_DECIMAL_PRECISION: u8 = 10;
/// Deepest `array`/`map`/`struct` nesting a descriptor may use.
pub const MAX_TYPE_NESTING: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Decimal { precision: u8, scale: u8 },
    String,
    Binary,
    Date,
    Timestamp,
    Array(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Struct(Vec<StructField>),
}

impl DataType {
    /// Parse a type descriptor. Keywords are case-insensitive; whitespace between tokens is ignored.
    pub fn parse(text: &str) -> CatalogResult<DataType> {
        let mut p = TypeParser { src: text, pos: 0, depth: 0 };
        let dt = p.parse_type()?;
        p.skip_ws();
        if p.pos != text.len() {
            return Err(p.error("unexpected trailing input"));
        }
        Ok(dt)
    }

    /// Canonical lower-case rendering.
    pub fn simple_string(&self) -> String {
        match self {
            DataType::Boolean => "boolean".into(),
            DataType::Byte => "tinyint".into(),
            DataType::Short => "smallint".into(),
            DataType::Integer => "int".into(),
            DataType::Long => "bigint".into(),
            DataType::Float => "float".into(),
            DataType::Double => "double".into(),
            DataType::Decimal { precision, scale } => format!("decimal({},{})", precision, scale),
            DataType::String => "string".into(),
            DataType::Binary => "binary".into(),
            DataType::Date => "date".into(),
            DataType::Timestamp => "timestamp".into(),
            DataType::Array(e) => format!("array<{}>", e.simple_string()),
            DataType::Map(k, v) => format!("map<{},{}>", k.simple_string(), v.simple_string()),
            DataType::Struct(fields) => {
                let inner: Vec<String> = fields.iter().map(|f| format!("{}:{}", f.name, f.data_type.simple_string())).collect();
                format!("struct<{}>", inner.join(","))
            }
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, DataType::Array(_) | DataType::Map(..) | DataType::Struct(_))
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.simple_string())
    }
}

struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn error(&self, what: &str) -> CatalogError {
        let shown: String = self.src.chars().take(80).collect();
        let ellipsis = if shown.len() < self.src.len() { "..." } else { "" };
        CatalogError::invalid(format!("cannot parse data type '{}{}': {} at offset {}", shown, ellipsis, what, self.pos))
    }

    fn rest(&self) -> &'a str { &self.src[self.pos..] }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    fn expect(&mut self, c: char) -> CatalogResult<()> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn word(&mut self) -> CatalogResult<String> {
        self.skip_ws();
        let len = self.rest().find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        let w = self.rest()[..len].to_string();
        self.pos += len;
        Ok(w)
    }

    fn field_name(&mut self) -> CatalogResult<String> {
        if self.peek() == Some('`') {
            self.pos += 1;
            let end = self.rest().find('`').ok_or_else(|| self.error("unterminated quoted field name"))?;
            let name = self.rest()[..end].to_string();
            self.pos += end + 1;
            Ok(name)
        } else {
            self.word()
        }
    }

    fn number(&mut self) -> CatalogResult<u32> {
        self.skip_ws();
        let len = self.rest().find(|c: char| !c.is_ascii_digit()).unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a number"));
        }
        let n = self.rest()[..len].parse::<u32>().map_err(|_| self.error("number out of range"))?;
        self.pos += len;
        Ok(n)
    }

    /// Optional `(n[, m])` argument list.
    fn args(&mut self) -> CatalogResult<Vec<u32>> {
        let mut out = Vec::new();
        if self.peek() != Some('(') {
            return Ok(out);
        }
        self.expect('(')?;
        out.push(self.number()?);
        while self.peek() == Some(',') {
            self.expect(',')?;
            out.push(self.number()?);
        }
        self.expect(')')?;
        Ok(out)
    }

    fn parse_type(&mut self) -> CatalogResult<DataType> {
        if self.depth >= MAX_TYPE_NESTING {
            return Err(self.error(&format!("type nesting deeper than {}", MAX_TYPE_NESTING)));
        }
        self.depth += 1;
        let dt = self.type_body();
        self.depth -= 1;
        dt
    }

    fn type_body(&mut self) -> CatalogResult<DataType> {
        let kw = self.word()?.to_ascii_lowercase();
        let dt = match kw.as_str() {
            "boolean" | "bool" => DataType::Boolean,
            "tinyint" | "byte" => DataType::Byte,
            "smallint" | "short" => DataType::Short,
            "int" | "integer" => DataType::Integer,
            "bigint" | "long" => DataType::Long,
            "float" | "real" => DataType::Float,
            "double" => DataType::Double,
            "string" => DataType::String,
            "binary" => DataType::Binary,
            "date" => DataType::Date,
            "timestamp" => DataType::Timestamp,
            "varchar" | "char" => {
                let a = self.args()?;
                if a.len() != 1 {
                    return Err(self.error("char/varchar take exactly one length"));
                }
                DataType::String
            }
            "decimal" | "dec" | "numeric" => self.decimal()?,
            "array" => {
                self.expect('<')?;
                let elem = self.parse_type()?;
                self.expect('>')?;
                DataType::Array(Box::new(elem))
            }
            "map" => {
                self.expect('<')?;
                let k = self.parse_type()?;
                self.expect(',')?;
                let v = self.parse_type()?;
                self.expect('>')?;
                DataType::Map(Box::new(k), Box::new(v))
            }
            "struct" => {
                self.expect('<')?;
                let mut fields = Vec::new();
                if self.peek() != Some('>') {
                    loop {
                        let name = self.field_name()?;
                        self.expect(':')?;
                        let data_type = self.parse_type()?;
                        fields.push(StructField { name, data_type, nullable: true });
                        if self.peek() == Some(',') { self.expect(',')?; } else { break; }
                    }
                }
                self.expect('>')?;
                DataType::Struct(fields)
            }
            other => return Err(self.error(&format!("unknown type '{}'", other))),
        };
        Ok(dt)
    }

    fn decimal(&mut self) -> CatalogResult<DataType> {
        let a = self.args()?;
        let (precision, scale) = match a.as_slice() {
            [] => (DEFAULT_DECIMAL_PRECISION as u32, 0),
            [p] => (*p, 0),
            [p, s] => (*p, *s),
            _ => return Err(self.error("decimal takes at most two arguments")),
        };
        if precision == 0 || precision > MAX_DECIMAL_PRECISION as u32 {
            return Err(self.error(&format!("decimal precision {} outside 1..={}", precision, MAX_DECIMAL_PRECISION)));
        }
        if scale > precision {
            return Err(self.error(&format!("decimal scale {} exceeds precision {}", scale, precision)));
        }
        Ok(DataType::Decimal { precision: precision as u8, scale: scale as u8 })
    }
}

#[cfg(test)]
#[path = "data_type_tests.rs"]
mod data_type_tests;
