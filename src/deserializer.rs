use std::fmt;
use std::iter;

use serde::de::value::StrDeserializer;
use serde::de::{
    DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess,
    Error as SerdeError, IntoDeserializer, SeqAccess, VariantAccess, Visitor,
};

use crate::decode::{parse_bool, DecodeError, DecodeErrorKind};
use crate::string_record::{StringRecord, StringRecordIter};

use self::DecodeErrorKind as DEK;

/// Decode all fields of `record` into `D`, by position.
///
/// Every field must be consumed.
pub(crate) fn deserialize_string_record<D: DeserializeOwned>(
    record: &StringRecord,
) -> Result<D, DecodeError> {
    let mut de = DeRecord { it: record.iter().peekable(), field: 0 };
    let value = D::deserialize(&mut de)?;
    if de.it.peek().is_some() {
        return Err(DecodeError::new(DEK::FieldCount {
            expected: de.field,
            got: record.len() as u64,
        }));
    }
    Ok(value)
}

impl SerdeError for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> DecodeError {
        DecodeError::new(DEK::Message(msg.to_string()))
    }
}

struct DeRecord<'r> {
    it: iter::Peekable<StringRecordIter<'r>>,
    /// The number of fields extracted so far.
    field: u64,
}

impl<'r> DeRecord<'r> {
    /// Returns an error corresponding to the most recently extracted field.
    fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind).at_field(self.field.saturating_sub(1))
    }

    fn next_field(&mut self) -> Result<&'r str, DecodeError> {
        match self.it.next() {
            Some(field) => {
                self.field += 1;
                Ok(field)
            }
            None => Err(DecodeError::new(DEK::UnexpectedEndOfRecord)
                .at_field(self.field)),
        }
    }

    fn peek_field(&mut self) -> Option<&'r str> {
        self.it.peek().cloned()
    }

    fn unsupported(&self, what: &str) -> DecodeError {
        DecodeError::new(DEK::UnsupportedType(what.to_string()))
    }
}

macro_rules! deserialize_int {
    ($method:ident, $visit:ident) => {
        fn $method<V: Visitor<'r>>(
            self,
            visitor: V,
        ) -> Result<V::Value, Self::Error> {
            let field = self.next_field()?;
            visitor.$visit(
                field.parse().map_err(|err| self.error(DEK::ParseInt(err)))?,
            )
        }
    };
}

macro_rules! deserialize_float {
    ($method:ident, $visit:ident) => {
        fn $method<V: Visitor<'r>>(
            self,
            visitor: V,
        ) -> Result<V::Value, Self::Error> {
            let field = self.next_field()?;
            visitor.$visit(
                field.parse().map_err(|err| self.error(DEK::ParseFloat(err)))?,
            )
        }
    };
}

impl<'a, 'r> Deserializer<'r> for &'a mut DeRecord<'r> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let x = self.next_field()?;
        if x == "true" {
            visitor.visit_bool(true)
        } else if x == "false" {
            visitor.visit_bool(false)
        } else if let Some(n) = try_positive_integer(x) {
            visitor.visit_u64(n)
        } else if let Some(n) = try_negative_integer(x) {
            visitor.visit_i64(n)
        } else if let Some(n) = try_float(x) {
            visitor.visit_f64(n)
        } else {
            visitor.visit_borrowed_str(x)
        }
    }

    fn deserialize_bool<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        match parse_bool(field) {
            Some(b) => visitor.visit_bool(b),
            None => Err(self.error(DEK::ParseBool(field.to_string()))),
        }
    }

    deserialize_int!(deserialize_u8, visit_u8);
    deserialize_int!(deserialize_u16, visit_u16);
    deserialize_int!(deserialize_u32, visit_u32);
    deserialize_int!(deserialize_u64, visit_u64);
    deserialize_int!(deserialize_i8, visit_i8);
    deserialize_int!(deserialize_i16, visit_i16);
    deserialize_int!(deserialize_i32, visit_i32);
    deserialize_int!(deserialize_i64, visit_i64);
    deserialize_float!(deserialize_f32, visit_f32);
    deserialize_float!(deserialize_f64, visit_f64);

    fn deserialize_char<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.error(DEK::Message(format!(
                "expected single character but got {} characters in '{}'",
                field.chars().count(),
                field
            )))),
        }
    }

    fn deserialize_str<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field().and_then(|f| visitor.visit_borrowed_str(f))
    }

    fn deserialize_string<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field().and_then(|f| visitor.visit_str(f))
    }

    fn deserialize_bytes<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field()
            .and_then(|f| visitor.visit_borrowed_bytes(f.as_bytes()))
    }

    fn deserialize_byte_buf<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field()
            .and_then(|f| visitor.visit_byte_buf(f.as_bytes().to_vec()))
    }

    fn deserialize_option<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.peek_field() {
            None => visitor.visit_none(),
            Some(f) if f.is_empty() => {
                self.next_field()?;
                visitor.visit_none()
            }
            Some(_) => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'r>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'r>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(Fields { de: self, len: None })
    }

    fn deserialize_tuple<V: Visitor<'r>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(Fields { de: self, len: Some(len) })
    }

    fn deserialize_tuple_struct<V: Visitor<'r>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(Fields { de: self, len: Some(len) })
    }

    fn deserialize_map<V: Visitor<'r>>(
        self,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.unsupported("map"))
    }

    fn deserialize_struct<V: Visitor<'r>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(Fields { de: self, len: Some(fields.len()) })
    }

    fn deserialize_identifier<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_enum<V: Visitor<'r>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_enum(self)
    }

    fn deserialize_ignored_any<V: Visitor<'r>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        // Read and drop the next field.
        let _ = self.next_field()?;
        visitor.visit_unit()
    }
}

/// Positional access to the remaining fields of a record.
///
/// A tuple or struct takes exactly `len` fields, while a sequence takes all
/// the fields that are left.
struct Fields<'a, 'r: 'a> {
    de: &'a mut DeRecord<'r>,
    len: Option<usize>,
}

impl<'a, 'r> SeqAccess<'r> for Fields<'a, 'r> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'r>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        if let Some(ref mut n) = self.len {
            if *n == 0 {
                return Ok(None);
            }
            *n -= 1;
        } else if self.de.peek_field().is_none() {
            return Ok(None);
        }
        let index = self.de.field;
        seed.deserialize(&mut *self.de)
            .map(Some)
            .map_err(|err| err.at_field(index))
    }

    fn size_hint(&self) -> Option<usize> {
        self.len
    }
}

impl<'a, 'r> EnumAccess<'r> for &'a mut DeRecord<'r> {
    type Error = DecodeError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'r>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), Self::Error> {
        let name: StrDeserializer<DecodeError> =
            self.next_field()?.into_deserializer();
        match seed.deserialize(name) {
            Ok(v) => Ok((v, self)),
            Err(err) => Err(err.at_field(self.field.saturating_sub(1))),
        }
    }
}

impl<'a, 'r> VariantAccess<'r> for &'a mut DeRecord<'r> {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'r>>(
        self,
        _seed: T,
    ) -> Result<T::Value, Self::Error> {
        Err(self.unsupported("newtype enum variant"))
    }

    fn tuple_variant<V: Visitor<'r>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.unsupported("tuple enum variant"))
    }

    fn struct_variant<V: Visitor<'r>>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.unsupported("struct enum variant"))
    }
}

fn try_positive_integer(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn try_negative_integer(s: &str) -> Option<i64> {
    if !s.starts_with('-') || try_positive_integer(&s[1..]).is_none() {
        return None;
    }
    s.parse().ok()
}

fn try_float(s: &str) -> Option<f64> {
    s.parse().ok()
}
